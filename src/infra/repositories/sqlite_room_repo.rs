use crate::domain::{
    models::room::{Room, RoomAssignment},
    ports::RoomRepository,
    services::room_assignment::{AssignmentDecision, AssignmentMap, AssignmentOutcome},
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::info;

pub struct SqliteRoomRepo {
    pool: SqlitePool,
}

impl SqliteRoomRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for SqliteRoomRepo {
    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (id, event_id, room_no, category, max_guests, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&room.id)
            .bind(&room.event_id)
            .bind(&room.room_no)
            .bind(&room.category)
            .bind(room.max_guests)
            .bind(room.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for slot in 1..=room.max_guests {
            sqlx::query("INSERT INTO room_assignments (room_id, event_id, slot, attendee_id) VALUES (?, ?, ?, NULL)")
                .bind(&room.id)
                .bind(&room.event_id)
                .bind(slot)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Room>, AppError> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE event_id = ? AND id = ?")
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Room>, AppError> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE event_id = ? ORDER BY room_no ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, room: &Room) -> Result<Room, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let occupied_above: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM room_assignments WHERE room_id = ? AND slot > ? AND attendee_id IS NOT NULL"
        )
            .bind(&room.id)
            .bind(room.max_guests)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if occupied_above > 0 {
            return Err(AppError::Conflict("Cannot shrink room below an occupied slot".into()));
        }

        let updated = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET room_no=?, category=?, max_guests=? WHERE id=? AND event_id=? RETURNING *"
        )
            .bind(&room.room_no)
            .bind(&room.category)
            .bind(room.max_guests)
            .bind(&room.id)
            .bind(&room.event_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query("DELETE FROM room_assignments WHERE room_id = ? AND slot > ?")
            .bind(&room.id)
            .bind(room.max_guests)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        for slot in 1..=room.max_guests {
            sqlx::query(
                "INSERT INTO room_assignments (room_id, event_id, slot, attendee_id) VALUES (?, ?, ?, NULL)
                 ON CONFLICT (room_id, slot) DO NOTHING"
            )
                .bind(&room.id)
                .bind(&room.event_id)
                .bind(slot)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM room_assignments WHERE room_id = ? AND event_id = ?")
            .bind(id)
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let result = sqlx::query("DELETE FROM rooms WHERE id = ? AND event_id = ?")
            .bind(id)
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Room not found".into()));
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_assignments(&self, event_id: &str) -> Result<Vec<RoomAssignment>, AppError> {
        sqlx::query_as::<_, RoomAssignment>(
            "SELECT room_id, event_id, slot, attendee_id FROM room_assignments WHERE event_id = ? ORDER BY room_id, slot"
        )
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_assignment_for_attendee(&self, event_id: &str, attendee_id: &str) -> Result<Option<RoomAssignment>, AppError> {
        sqlx::query_as::<_, RoomAssignment>(
            "SELECT room_id, event_id, slot, attendee_id FROM room_assignments WHERE event_id = ? AND attendee_id = ?"
        )
            .bind(event_id)
            .bind(attendee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn apply_assignment(
        &self,
        event_id: &str,
        room_id: &str,
        slot: i32,
        attendee_id: Option<&str>,
    ) -> Result<AssignmentOutcome, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let current = sqlx::query_as::<_, RoomAssignment>(
            "SELECT room_id, event_id, slot, attendee_id FROM room_assignments WHERE event_id = ?"
        )
            .bind(event_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let decision = AssignmentMap::from_assignments(&current).check(room_id, slot, attendee_id);

        if let AssignmentDecision::Conflict(at) = decision {
            info!("Assignment rejected: attendee already in room {} slot {}", at.room_id, at.slot);
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(AssignmentOutcome::Conflict(at));
        }

        if let AssignmentDecision::Place { vacate: Some(old_slot) } = decision {
            sqlx::query("UPDATE room_assignments SET attendee_id = NULL WHERE room_id = ? AND slot = ?")
                .bind(room_id)
                .bind(old_slot)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        }

        let result = sqlx::query("UPDATE room_assignments SET attendee_id = ? WHERE room_id = ? AND event_id = ? AND slot = ?")
            .bind(attendee_id)
            .bind(room_id)
            .bind(event_id)
            .bind(slot)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Room slot not found".into()));
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(AssignmentOutcome::Applied)
    }
}
