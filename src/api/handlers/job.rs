use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::responses::JobView;
use crate::api::extractors::{auth::AdminAuth, event::EventScope};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    EventScope(event): EventScope,
) -> Result<impl IntoResponse, AppError> {
    let jobs = state.job_repo.list_by_event(&event.id).await?;
    Ok(Json(jobs.into_iter().map(JobView::from).collect::<Vec<_>>()))
}

pub async fn retry_job(
    State(state): State<Arc<AppState>>,
    AdminAuth(claims): AdminAuth,
    EventScope(event): EventScope,
    Path((_, job_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let job = state.job_repo.retry(&event.id, &job_id).await?;
    info!("Job {} requeued by {}", job.id, claims.sub);
    Ok(Json(JobView::from(job)))
}
