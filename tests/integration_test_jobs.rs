mod common;

use axum::http::StatusCode;
use common::TestApp;
use event_guest_backend::background::run_pending_jobs;

#[tokio::test]
async fn test_failed_delivery_retries_then_parks() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "outbox").await;
    let invite = app.create_invite(&auth, &event_id, "jo@corp.com", "Jo", "Ng").await;
    let invite_id = invite["id"].as_str().unwrap();

    let (status, _) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/{}/send", event_id, invite_id), None).await;
    assert_eq!(status, StatusCode::OK);

    app.emails.set_failing(true);
    assert_eq!(run_pending_jobs(&app.state).await, 1);

    let jobs_uri = format!("/api/events/{}/jobs", event_id);
    let (status, jobs) = app.admin_request(&auth, "GET", &jobs_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = jobs.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["status"], "PENDING");
    assert_eq!(jobs[0]["attempts"], 1);
    assert_eq!(jobs[0]["targetId"], invite_id);
    assert!(jobs[0]["errorMessage"].as_str().unwrap().contains("Mail provider unavailable"));

    // backoff keeps it out of the next batch
    assert_eq!(run_pending_jobs(&app.state).await, 0);

    for _ in 0..2 {
        app.make_jobs_due().await;
        assert_eq!(run_pending_jobs(&app.state).await, 1);
    }

    let (_, jobs) = app.admin_request(&auth, "GET", &jobs_uri, None).await;
    assert_eq!(jobs[0]["status"], "FAILED");
    assert_eq!(jobs[0]["attempts"], 3);
    assert!(app.emails.sent.lock().unwrap().is_empty());

    app.emails.set_failing(false);
    let job_id = jobs[0]["id"].as_str().unwrap().to_string();
    let (status, retried) = app.admin_request(&auth, "POST", &format!("{}/{}/retry", jobs_uri, job_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(retried["status"], "PENDING");
    assert_eq!(retried["attempts"], 0);

    assert_eq!(run_pending_jobs(&app.state).await, 1);
    let (_, jobs) = app.admin_request(&auth, "GET", &jobs_uri, None).await;
    assert_eq!(jobs[0]["status"], "COMPLETED");
    assert!(jobs[0]["errorMessage"].is_null());
    assert_eq!(app.emails.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_rejects_jobs_that_have_not_failed() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "outbox-2").await;
    let invite = app.create_invite(&auth, &event_id, "al@corp.com", "Al", "Bo").await;
    let invite_id = invite["id"].as_str().unwrap();
    app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/{}/send", event_id, invite_id), None).await;

    let (_, jobs) = app.admin_request(&auth, "GET", &format!("/api/events/{}/jobs", event_id), None).await;
    let job_id = jobs[0]["id"].as_str().unwrap();

    let (status, body) = app.admin_request(&auth, "POST", &format!("/api/events/{}/jobs/{}/retry", event_id, job_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app.admin_request(&auth, "POST", &format!("/api/events/{}/jobs/missing/retry", event_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_jobs_are_scoped_to_their_event() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let first = app.create_event(&auth, "scope-a").await;
    let second = app.create_event(&auth, "scope-b").await;
    let invite = app.create_invite(&auth, &first, "x@corp.com", "X", "Y").await;
    app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/{}/send", first, invite["id"].as_str().unwrap()), None).await;

    let (_, jobs) = app.admin_request(&auth, "GET", &format!("/api/events/{}/jobs", second), None).await;
    assert_eq!(jobs.as_array().unwrap().len(), 0);
}
