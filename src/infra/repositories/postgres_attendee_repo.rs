use crate::domain::{models::{attendee::Attendee, invite::Invite}, ports::AttendeeRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresAttendeeRepo {
    pool: PgPool,
}

impl PostgresAttendeeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendeeRepository for PostgresAttendeeRepo {
    async fn create(&self, attendee: &Attendee) -> Result<Attendee, AppError> {
        sqlx::query_as::<_, Attendee>(
            r#"INSERT INTO attendees (
                id, event_id, email, first_name, last_name, phone, work_email, location, gender,
                dietary_requirements, accepted_at, id_doc_url, phone_verified, tasks_json, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *"#
        )
            .bind(&attendee.id)
            .bind(&attendee.event_id)
            .bind(&attendee.email)
            .bind(&attendee.first_name)
            .bind(&attendee.last_name)
            .bind(&attendee.phone)
            .bind(&attendee.work_email)
            .bind(&attendee.location)
            .bind(&attendee.gender)
            .bind(&attendee.dietary_requirements)
            .bind(attendee.accepted_at)
            .bind(&attendee.id_doc_url)
            .bind(attendee.phone_verified)
            .bind(&attendee.tasks)
            .bind(attendee.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, event_id: &str, id: &str) -> Result<Option<Attendee>, AppError> {
        sqlx::query_as::<_, Attendee>("SELECT * FROM attendees WHERE event_id = $1 AND id = $2")
            .bind(event_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_email(&self, event_id: &str, email: &str) -> Result<Option<Attendee>, AppError> {
        sqlx::query_as::<_, Attendee>("SELECT * FROM attendees WHERE event_id = $1 AND email = $2")
            .bind(event_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_event(&self, event_id: &str) -> Result<Vec<Attendee>, AppError> {
        sqlx::query_as::<_, Attendee>("SELECT * FROM attendees WHERE event_id = $1 ORDER BY created_at ASC")
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, attendee: &Attendee) -> Result<Attendee, AppError> {
        sqlx::query_as::<_, Attendee>(
            r#"UPDATE attendees SET
                first_name=$1, last_name=$2, phone=$3, work_email=$4, location=$5, gender=$6,
                dietary_requirements=$7, accepted_at=$8, id_doc_url=$9, phone_verified=$10, tasks_json=$11
            WHERE id=$12 AND event_id=$13
            RETURNING *"#
        )
            .bind(&attendee.first_name)
            .bind(&attendee.last_name)
            .bind(&attendee.phone)
            .bind(&attendee.work_email)
            .bind(&attendee.location)
            .bind(&attendee.gender)
            .bind(&attendee.dietary_requirements)
            .bind(attendee.accepted_at)
            .bind(&attendee.id_doc_url)
            .bind(attendee.phone_verified)
            .bind(&attendee.tasks)
            .bind(&attendee.id)
            .bind(&attendee.event_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn accept(&self, attendee: &Attendee, invite: &Invite) -> Result<Attendee, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("UPDATE invites SET status=$1, accepted_at=$2 WHERE id=$3 AND event_id=$4")
            .bind(invite.status)
            .bind(invite.accepted_at)
            .bind(&invite.id)
            .bind(&invite.event_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let accepted = sqlx::query_as::<_, Attendee>(
            "UPDATE attendees SET accepted_at=$1 WHERE id=$2 AND event_id=$3 RETURNING *"
        )
            .bind(attendee.accepted_at)
            .bind(&attendee.id)
            .bind(&attendee.event_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(accepted)
    }
}
