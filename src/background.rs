use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tera::{Context, Tera};
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::{
    broadcast::BroadcastChannel,
    event::Event,
    job::{Job, JOB_BROADCAST, JOB_INVITE_EMAIL},
};
use crate::error::AppError;
use crate::infra::factory::{BROADCAST_TEMPLATE, INVITATION_TEMPLATE};

const BATCH_SIZE: i32 = 10;
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const PURGE_INTERVAL: Duration = Duration::from_secs(600);

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");
    match state.job_repo.requeue_interrupted().await {
        Ok(0) => {}
        Ok(n) => warn!("Requeued {} jobs interrupted by the last shutdown", n),
        Err(e) => error!("Failed to requeue interrupted jobs: {:?}", e),
    }

    let mut last_purge: Option<Instant> = None;

    loop {
        run_pending_jobs(&state).await;

        if last_purge.is_none_or(|at| at.elapsed() >= PURGE_INTERVAL) {
            purge_expired_credentials(&state).await;
            last_purge = Some(Instant::now());
        }

        sleep(POLL_INTERVAL).await;
    }
}

/// Claims and processes one batch of due jobs. Returns how many were claimed.
pub async fn run_pending_jobs(state: &Arc<AppState>) -> usize {
    let jobs = match state.job_repo.claim_due(BATCH_SIZE).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Failed to claim due jobs: {:?}", e);
            return 0;
        }
    };
    let claimed = jobs.len();

    for job in jobs {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            event_id = %job.target().event_id,
            attempt = job.attempts
        );

        async {
            match process_job(state, &job).await {
                Ok(_) => {
                    info!("Job completed");
                    if let Err(e) = state.job_repo.complete(&job.id).await {
                        error!("Failed to mark job as completed: {:?}", e);
                    }
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    let retry_at = job.next_retry(Utc::now());
                    match retry_at {
                        Some(at) => warn!("Job failed, retrying at {}: {}", at, err_msg),
                        None => error!("Job failed permanently: {}", err_msg),
                    }
                    if let Err(up_err) = state.job_repo.fail(&job.id, &err_msg, retry_at).await {
                        error!("Failed to record job failure: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    claimed
}

/// Removes refresh tokens and OTP codes that can no longer be used.
pub async fn purge_expired_credentials(state: &AppState) {
    match state.auth_service.purge_expired().await {
        Ok(0) => {}
        Ok(n) => info!("Purged {} expired refresh tokens", n),
        Err(e) => error!("Refresh token purge failed: {:?}", e),
    }
    match state.otp_service.purge_expired().await {
        Ok(0) => {}
        Ok(n) => info!("Purged {} expired OTP codes", n),
        Err(e) => error!("OTP purge failed: {:?}", e),
    }
}

async fn process_job(state: &AppState, job: &Job) -> Result<(), AppError> {
    let event_id = &job.target().event_id;
    let event = state.event_repo.find_by_id(event_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

    match job.job_type.as_str() {
        JOB_INVITE_EMAIL => send_invitation(state, &event, job).await,
        JOB_BROADCAST => deliver_broadcast(state, &event, job).await,
        other => Err(AppError::InternalWithMsg(format!("Unknown job type {}", other))),
    }
}

async fn send_invitation(state: &AppState, event: &Event, job: &Job) -> Result<(), AppError> {
    let target = job.target();
    let invite = state.invite_repo.find_by_id(&event.id, &target.target_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Invite {} not found", target.target_id)))?;

    let mut context = Context::new();
    context.insert("event_name", &event.name);
    context.insert("location", &event.location);
    context.insert("starts_at", &local_time(event, event.starts_at));
    context.insert("first_name", &invite.first_name);
    context.insert("email", &invite.email);
    context.insert("app_url", &state.config.mobile_app_url);

    let html = render_template(&state.templates, INVITATION_TEMPLATE, &context)?;
    let subject = format!("You're invited to {}", event.name);

    info!("Sending invitation to {}", invite.email);
    state.email_service.send(&invite.email, &subject, &html).await
}

async fn deliver_broadcast(state: &AppState, event: &Event, job: &Job) -> Result<(), AppError> {
    let target = job.target();
    let broadcast = state.broadcast_repo.find_by_id(&event.id, &target.target_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Broadcast {} not found", target.target_id)))?;

    let attendee_id = target.recipient.as_deref()
        .ok_or_else(|| AppError::InternalWithMsg("Broadcast job without recipient".into()))?;
    let attendee = state.attendee_repo.find_by_id(&event.id, attendee_id).await?
        .ok_or_else(|| AppError::NotFound(format!("Attendee {} not found", attendee_id)))?;

    match BroadcastChannel::parse(&broadcast.channel) {
        Some(BroadcastChannel::Email) => {
            let mut context = Context::new();
            context.insert("event_name", &event.name);
            context.insert("title", &broadcast.title);
            context.insert("body", &broadcast.body);
            let html = render_template(&state.templates, BROADCAST_TEMPLATE, &context)?;
            state.email_service.send(&attendee.email, &broadcast.title, &html).await
        }
        Some(BroadcastChannel::Sms) => match attendee.phone.as_deref() {
            Some(phone) => {
                let text = format!("{}: {}", broadcast.title, broadcast.body);
                state.sms_service.send(phone, &text).await
            }
            None => {
                warn!("Attendee {} has no phone, skipping SMS", attendee.id);
                Ok(())
            }
        },
        // no push provider wired up yet
        Some(BroadcastChannel::Push) => {
            info!("Push broadcast {} for attendee {} recorded", broadcast.id, attendee.id);
            Ok(())
        }
        None => Err(AppError::InternalWithMsg(format!("Unknown channel {}", broadcast.channel))),
    }
}

pub fn render_template(templates: &Tera, name: &str, context: &Context) -> Result<String, AppError> {
    templates.render(name, context).map_err(|e| {
        error!("Tera render error: {:?}", e);
        AppError::InternalWithMsg(format!("Template render error: {}", e))
    })
}

fn local_time(event: &Event, at: DateTime<Utc>) -> String {
    let tz: Tz = event.timezone.parse().unwrap_or(chrono_tz::UTC);
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M %Z").to_string()
}
