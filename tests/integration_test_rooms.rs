mod common;

use axum::http::StatusCode;
use common::{AuthHeaders, TestApp};
use serde_json::{json, Value};

async fn create_room(app: &TestApp, auth: &AuthHeaders, event_id: &str, room_no: &str, max_guests: i32) -> String {
    let (status, body) = app.admin_request(auth, "POST", &format!("/api/events/{}/rooms", event_id), Some(json!({
        "roomNo": room_no,
        "category": "Double",
        "maxGuests": max_guests
    }))).await;
    assert_eq!(status, StatusCode::OK, "create room failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Invites a guest and signs them in so an attendee row exists.
async fn attendee(app: &TestApp, auth: &AuthHeaders, event_id: &str, email: &str) -> String {
    app.create_invite(auth, event_id, email, "Room", "Guest").await;
    let token = app.mobile_login(event_id, email).await;
    let (status, profile) = app.mobile_request(&token, "GET", "/api/mobile/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    profile["id"].as_str().unwrap().to_string()
}

async fn assign(app: &TestApp, auth: &AuthHeaders, event_id: &str, room_id: &str, slot: i32, attendee_id: &str) -> (StatusCode, Value) {
    app.admin_request(auth, "POST", &format!("/api/events/{}/rooms/assign", event_id), Some(json!({
        "roomId": room_id,
        "slot": slot,
        "attendeeId": attendee_id
    }))).await
}

fn slot_occupant(room: &Value, slot: i64) -> Value {
    room["slots"].as_array().unwrap().iter()
        .find(|s| s["slot"] == slot)
        .map(|s| s["attendeeId"].clone())
        .unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_room_is_created_with_empty_slots() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "rooms").await;
    create_room(&app, &auth, &event_id, "101", 3).await;

    let (status, rooms) = app.admin_request(&auth, "GET", &format!("/api/events/{}/rooms", event_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let room = &rooms[0];
    assert_eq!(room["roomNo"], "101");
    assert_eq!(room["status"], "empty");
    assert_eq!(room["slots"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_capacity_is_validated() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "capacity").await;

    for max_guests in [0, 4] {
        let (status, body) = app.admin_request(&auth, "POST", &format!("/api/events/{}/rooms", event_id), Some(json!({
            "roomNo": "X", "maxGuests": max_guests
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION");
    }

    create_room(&app, &auth, &event_id, "201", 2).await;
    let (status, _) = app.admin_request(&auth, "POST", &format!("/api/events/{}/rooms", event_id), Some(json!({
        "roomNo": "201", "maxGuests": 1
    }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_assigning_to_second_room_is_rejected() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "conflict").await;
    let r1 = create_room(&app, &auth, &event_id, "R1", 2).await;
    let r2 = create_room(&app, &auth, &event_id, "R2", 2).await;
    let guest = attendee(&app, &auth, &event_id, "g@x.com").await;

    let (status, room) = assign(&app, &auth, &event_id, &r1, 1, &guest).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot_occupant(&room, 1), json!(guest));
    assert_eq!(room["status"], "partial");

    let (status, body) = assign(&app, &auth, &event_id, &r2, 1, &guest).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_ASSIGNED");
    assert_eq!(body["alreadyAssigned"]["roomId"], json!(r1));
    assert_eq!(body["alreadyAssigned"]["slot"], 1);

    let (_, rooms) = app.admin_request(&auth, "GET", &format!("/api/events/{}/rooms", event_id), None).await;
    let second = rooms.as_array().unwrap().iter().find(|r| r["id"] == json!(r2)).unwrap();
    assert_eq!(second["status"], "empty");
    assert_eq!(slot_occupant(second, 1), Value::Null);
}

#[tokio::test]
async fn test_move_within_room_vacates_old_slot() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "move").await;
    let room_id = create_room(&app, &auth, &event_id, "301", 3).await;
    let guest = attendee(&app, &auth, &event_id, "mover@x.com").await;

    assign(&app, &auth, &event_id, &room_id, 1, &guest).await;
    let (status, room) = assign(&app, &auth, &event_id, &room_id, 3, &guest).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot_occupant(&room, 1), Value::Null);
    assert_eq!(slot_occupant(&room, 3), json!(guest));

    // same slot again is a no-op
    let (status, room) = assign(&app, &auth, &event_id, &room_id, 3, &guest).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot_occupant(&room, 3), json!(guest));
}

#[tokio::test]
async fn test_clear_and_unassign_slots() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "clear").await;
    let room_id = create_room(&app, &auth, &event_id, "401", 2).await;
    let first = attendee(&app, &auth, &event_id, "first@x.com").await;
    let second = attendee(&app, &auth, &event_id, "second@x.com").await;

    assign(&app, &auth, &event_id, &room_id, 1, &first).await;
    let (_, room) = assign(&app, &auth, &event_id, &room_id, 2, &second).await;
    assert_eq!(room["status"], "full");

    let (status, room) = app.admin_request(&auth, "POST", &format!("/api/events/{}/rooms/clear", event_id), Some(json!({
        "roomId": room_id, "slot": 1
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(slot_occupant(&room, 1), Value::Null);
    assert_eq!(room["status"], "partial");

    let (status, room) = app.admin_request(&auth, "DELETE", &format!("/api/events/{}/rooms/{}/unassign?slot=2", event_id, room_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["status"], "empty");

    // a freed guest can go to another room
    let other = create_room(&app, &auth, &event_id, "402", 1).await;
    let (status, _) = assign(&app, &auth, &event_id, &other, 1, &second).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.admin_request(&auth, "POST", &format!("/api/events/{}/rooms/clear", event_id), Some(json!({
        "roomId": room_id, "slot": 3
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = assign(&app, &auth, &event_id, &room_id, 1, "missing-attendee").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shrinking_below_occupied_slot_conflicts() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "shrink").await;
    let room_id = create_room(&app, &auth, &event_id, "501", 3).await;
    let guest = attendee(&app, &auth, &event_id, "tail@x.com").await;
    assign(&app, &auth, &event_id, &room_id, 3, &guest).await;

    let uri = format!("/api/events/{}/rooms/{}", event_id, room_id);
    let (status, _) = app.admin_request(&auth, "PUT", &uri, Some(json!({"maxGuests": 2}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, room) = app.admin_request(&auth, "PUT", &uri, Some(json!({"category": "Suite"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["category"], "Suite");
    assert_eq!(room["slots"].as_array().unwrap().len(), 3);

    app.admin_request(&auth, "DELETE", &format!("{}/unassign?slot=3", uri), None).await;
    let (status, room) = app.admin_request(&auth, "PUT", &uri, Some(json!({"maxGuests": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["slots"].as_array().unwrap().len(), 1);

    let (status, _) = app.admin_request(&auth, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.admin_request(&auth, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Every attendee id that appears in a slot, across all rooms of the event.
fn seated_attendees(rooms: &Value) -> Vec<String> {
    rooms.as_array().unwrap().iter()
        .flat_map(|room| room["slots"].as_array().unwrap().iter())
        .filter_map(|slot| slot["attendeeId"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_random_assign_and_clear_sequence_keeps_one_slot_per_attendee() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "shuffle").await;
    let rooms = [
        (create_room(&app, &auth, &event_id, "S1", 2).await, 2),
        (create_room(&app, &auth, &event_id, "S2", 3).await, 3),
    ];
    let mut guests = Vec::new();
    for email in ["a@x.com", "b@x.com", "c@x.com"] {
        guests.push(attendee(&app, &auth, &event_id, email).await);
    }

    let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
    for step in 0..60 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let (room_id, capacity) = &rooms[(seed % 2) as usize];
        let slot = ((seed >> 8) % capacity) as i32 + 1;
        let pick = ((seed >> 16) % 4) as usize;

        if pick == 3 {
            let (status, body) = app.admin_request(&auth, "POST", &format!("/api/events/{}/rooms/clear", event_id), Some(json!({
                "roomId": room_id, "slot": slot
            }))).await;
            assert_eq!(status, StatusCode::OK, "step {}: clear failed: {}", step, body);
        } else {
            let (status, body) = assign(&app, &auth, &event_id, room_id, slot, &guests[pick]).await;
            match status {
                StatusCode::OK => assert_eq!(slot_occupant(&body, slot as i64), json!(guests[pick])),
                StatusCode::BAD_REQUEST => {
                    assert_eq!(body["code"], "ALREADY_ASSIGNED", "step {}", step);
                    assert_ne!(body["alreadyAssigned"]["roomId"], json!(room_id));
                }
                other => panic!("step {}: unexpected status {} ({})", step, other, body),
            }
        }

        let (status, listed) = app.admin_request(&auth, "GET", &format!("/api/events/{}/rooms", event_id), None).await;
        assert_eq!(status, StatusCode::OK);
        let mut seated = seated_attendees(&listed);
        let total = seated.len();
        seated.sort();
        seated.dedup();
        assert_eq!(seated.len(), total, "step {}: an attendee holds two slots: {}", step, listed);
    }
}

#[tokio::test]
async fn test_unique_index_rejects_second_row_for_same_attendee() {
    let app = TestApp::new().await;
    let auth = app.admin().await;
    let event_id = app.create_event(&auth, "index").await;
    let room_id = create_room(&app, &auth, &event_id, "I1", 2).await;
    let guest = attendee(&app, &auth, &event_id, "idx@x.com").await;
    let (status, _) = assign(&app, &auth, &event_id, &room_id, 1, &guest).await;
    assert_eq!(status, StatusCode::OK);

    let insert = "INSERT INTO room_assignments (room_id, event_id, slot, attendee_id) VALUES (?, ?, ?, ?)";

    let err = sqlx::query(insert)
        .bind(&room_id)
        .bind(&event_id)
        .bind(9)
        .bind(&guest)
        .execute(&app.pool)
        .await
        .expect_err("duplicate attendee row must be rejected");
    assert!(err.to_string().contains("UNIQUE"), "unexpected error: {}", err);

    // empty slots are not covered by the index
    for slot in [8, 9] {
        sqlx::query(insert)
            .bind(&room_id)
            .bind(&event_id)
            .bind(slot)
            .bind(Option::<String>::None)
            .execute(&app.pool)
            .await
            .unwrap();
    }
}
