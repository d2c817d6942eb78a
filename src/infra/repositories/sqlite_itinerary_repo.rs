use crate::domain::{models::itinerary::ItineraryItem, ports::ItineraryRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteItineraryRepo {
    pool: SqlitePool,
}

impl SqliteItineraryRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl ItineraryRepository for SqliteItineraryRepo {
    async fn create(&self, item: &ItineraryItem) -> Result<ItineraryItem, AppError> {
        sqlx::query_as::<_, ItineraryItem>(
            "INSERT INTO itinerary_items (id, event_id, title, description, location, starts_at, ends_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&item.id)
            .bind(&item.event_id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(&item.location)
            .bind(item.starts_at)
            .bind(item.ends_at)
            .bind(item.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<ItineraryItem>, AppError> {
        sqlx::query_as::<_, ItineraryItem>("SELECT * FROM itinerary_items WHERE event_id = ? AND id = ?")
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<ItineraryItem>, AppError> {
        sqlx::query_as::<_, ItineraryItem>("SELECT * FROM itinerary_items WHERE event_id = ? ORDER BY starts_at ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, item: &ItineraryItem) -> Result<ItineraryItem, AppError> {
        sqlx::query_as::<_, ItineraryItem>(
            "UPDATE itinerary_items SET title=?, description=?, location=?, starts_at=?, ends_at=? WHERE id=? AND event_id=? RETURNING *"
        )
            .bind(&item.title)
            .bind(&item.description)
            .bind(&item.location)
            .bind(item.starts_at)
            .bind(item.ends_at)
            .bind(&item.id)
            .bind(&item.event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, event_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM itinerary_items WHERE id = ? AND event_id = ?")
            .bind(id)
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Itinerary item not found".into()));
        }
        Ok(())
    }
}
