mod common;

use axum::http::StatusCode;
use common::TestApp;
use event_guest_backend::background::run_pending_jobs;
use serde_json::{json, Value};

fn statuses(page: &Value) -> Vec<String> {
    page["items"].as_array().unwrap().iter()
        .map(|g| g["derivedStatus"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_import_then_send_keeps_invited() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "import").await;

    let (status, counts) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/import", event_id), Some(json!({
        "rows": [
            {"email": " A@X.com ", "firstName": "Ana"},
            {"email": "not-an-email"}
        ]
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts["created"], 1);
    assert_eq!(counts["updated"], 0);
    assert_eq!(counts["skipped"], 1);

    let list_uri = format!("/api/events/{}/invites", event_id);
    let (_, page) = app.admin_request(&auth, "GET", &list_uri, None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["email"], "a@x.com");
    assert_eq!(page["items"][0]["status"], "pending");
    assert_eq!(statuses(&page), vec!["invited"]);

    let invite_id = page["items"][0]["id"].as_str().unwrap().to_string();
    let (status, sent) = app.admin_request(&auth, "POST", &format!("{}/{}/send", list_uri, invite_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");
    assert!(sent["lastSentAt"].is_string());

    let (_, page) = app.admin_request(&auth, "GET", &list_uri, None).await;
    assert_eq!(statuses(&page), vec!["invited"]);

    // re-importing the same address updates instead of duplicating
    let (_, counts) = app.admin_request(&auth, "POST", &format!("{}/import", list_uri), Some(json!({
        "rows": [{"email": "a@x.com", "lastName": "Silva"}]
    }))).await;
    assert_eq!(counts["created"], 0);
    assert_eq!(counts["updated"], 1);

    let (_, page) = app.admin_request(&auth, "GET", &list_uri, None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["firstName"], "Ana");
    assert_eq!(page["items"][0]["lastName"], "Silva");
    assert_eq!(page["items"][0]["status"], "sent");
}

#[tokio::test]
async fn test_guest_list_pagination() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "paging").await;

    let rows: Vec<Value> = (0..25)
        .map(|i| json!({"email": format!("guest{:02}@x.com", i)}))
        .collect();
    let (status, _) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/import", event_id), Some(json!({
        "rows": rows
    }))).await;
    assert_eq!(status, StatusCode::OK);

    let uri = |page: usize| format!("/api/events/{}/invites?page={}&pageSize=20", event_id, page);

    let (_, first) = app.admin_request(&auth, "GET", &uri(1), None).await;
    assert_eq!(first["items"].as_array().unwrap().len(), 20);
    assert_eq!(first["total"], 25);
    assert_eq!(first["totalPages"], 2);

    let (_, second) = app.admin_request(&auth, "GET", &uri(2), None).await;
    assert_eq!(second["items"].as_array().unwrap().len(), 5);
    assert_eq!(second["page"], 2);

    let (status, third) = app.admin_request(&auth, "GET", &uri(3), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third["items"], json!([]));
    assert_eq!(third["total"], 25);
    assert_eq!(third["totalPages"], 2);
}

#[tokio::test]
async fn test_guest_list_search_and_sort() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "search").await;

    app.create_invite(&auth, &event_id, "zoe@x.com", "Zoe", "Adams").await;
    app.create_invite(&auth, &event_id, "bob@x.com", "Bob", "Young").await;
    app.create_invite(&auth, &event_id, "carla@corp.com", "Carla", "Mendes").await;

    let (_, page) = app.admin_request(&auth, "GET", &format!("/api/events/{}/invites?sort=name_asc", event_id), None).await;
    let names: Vec<&str> = page["items"].as_array().unwrap().iter()
        .map(|g| g["firstName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bob", "Carla", "Zoe"]);

    let (_, page) = app.admin_request(&auth, "GET", &format!("/api/events/{}/invites?q=CORP", event_id), None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["email"], "carla@corp.com");

    let (_, page) = app.admin_request(&auth, "GET", &format!("/api/events/{}/invites?q=young", event_id), None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["firstName"], "Bob");

    let (_, page) = app.admin_request(&auth, "GET", &format!("/api/events/{}/invites?status=accepted", event_id), None).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_duplicate_invite_conflicts() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "dupes").await;

    app.create_invite(&auth, &event_id, "dup@x.com", "Dup", "One").await;
    let (status, body) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites", event_id), Some(json!({
        "email": "DUP@x.com"
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites", event_id), Some(json!({
        "email": "nope"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_pending_delivers_invitation_emails() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "delivery").await;

    app.create_invite(&auth, &event_id, "one@x.com", "One", "Guest").await;
    app.create_invite(&auth, &event_id, "two@x.com", "Two", "Guest").await;

    let (status, body) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/send-pending", event_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 2);

    // nothing left to send
    let (_, body) = app.admin_request(&auth, "POST", &format!("/api/events/{}/invites/send-pending", event_id), None).await;
    assert_eq!(body["sent"], 0);

    let processed = run_pending_jobs(&app.state).await;
    assert_eq!(processed, 2);

    let sent = app.emails.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    let mail = sent.iter().find(|m| m.recipient == "one@x.com").expect("invitation to one@x.com");
    assert_eq!(mail.subject, "You're invited to Event delivery");
    assert!(mail.html_body.contains("One"));
    assert!(mail.html_body.contains("https://app.test"));

    assert_eq!(run_pending_jobs(&app.state).await, 0);
}

#[tokio::test]
async fn test_update_and_delete_invite_keeps_attendee() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "cleanup").await;

    let invite = app.create_invite(&auth, &event_id, "keep@x.com", "Keep", "Me").await;
    let invite_id = invite["id"].as_str().unwrap();

    let (status, updated) = app.admin_request(&auth, "PUT", &format!("/api/events/{}/invites/{}", event_id, invite_id), Some(json!({
        "phone": "+351900000000",
        "countryCode": "PT"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["phone"], "+351900000000");
    assert_eq!(updated["firstName"], "Keep");

    let token = app.mobile_login(&event_id, "keep@x.com").await;
    let (status, _) = app.mobile_request(&token, "GET", "/api/mobile/profile", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.admin_request(&auth, "DELETE", &format!("/api/events/{}/invites/{}", event_id, invite_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = app.admin_request(&auth, "GET", &format!("/api/events/{}/invites", event_id), None).await;
    assert_eq!(page["total"], 0);

    let (_, attendees) = app.admin_request(&auth, "GET", &format!("/api/events/{}/attendees", event_id), None).await;
    let attendees = attendees.as_array().unwrap();
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0]["email"], "keep@x.com");
    assert_eq!(attendees[0]["phone"], "+351900000000");

    let (status, _) = app.admin_request(&auth, "DELETE", &format!("/api/events/{}/invites/{}", event_id, invite_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resending_an_accepted_invite_marks_it_sent() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "resend-accepted").await;
    let invite = app.create_invite(&auth, &event_id, "kim@x.com", "Kim", "Lee").await;
    let invite_id = invite["id"].as_str().unwrap();

    let token = app.mobile_login(&event_id, "kim@x.com").await;
    let (status, _) = app.mobile_request(&token, "POST", "/api/mobile/profile/accept", None).await;
    assert_eq!(status, StatusCode::OK);

    let list_uri = format!("/api/events/{}/invites", event_id);
    let (_, page) = app.admin_request(&auth, "GET", &list_uri, None).await;
    assert_eq!(page["items"][0]["status"], "accepted");
    let accepted_at = page["items"][0]["acceptedAt"].clone();

    let (status, resent) = app.admin_request(&auth, "POST", &format!("{}/{}/resend", list_uri, invite_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resent["status"], "sent");
    assert!(resent["lastSentAt"].is_string());
    assert_eq!(resent["acceptedAt"], accepted_at);

    // the attendee's own acceptance still drives the derived status
    let (_, page) = app.admin_request(&auth, "GET", &list_uri, None).await;
    assert_eq!(page["items"][0]["status"], "sent");
    assert_eq!(statuses(&page), vec!["accepted"]);
}
