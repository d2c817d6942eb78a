use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const MIN_GUESTS_PER_ROOM: i32 = 1;
pub const MAX_GUESTS_PER_ROOM: i32 = 3;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub event_id: String,
    pub room_no: String,
    pub category: Option<String>,
    pub max_guests: i32,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(event_id: String, room_no: String, category: Option<String>, max_guests: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            room_no,
            category,
            max_guests,
            created_at: Utc::now(),
        }
    }

    pub fn has_slot(&self, slot: i32) -> bool {
        (1..=self.max_guests).contains(&slot)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomAssignment {
    pub room_id: String,
    pub event_id: String,
    pub slot: i32,
    pub attendee_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Empty,
    Partial,
    Full,
}

impl RoomStatus {
    pub fn from_occupancy(occupied: usize, max_guests: i32) -> Self {
        match occupied {
            0 => RoomStatus::Empty,
            n if n as i32 >= max_guests => RoomStatus::Full,
            _ => RoomStatus::Partial,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub slot: i32,
    pub attendee_id: Option<String>,
}

/// A room together with its slots and occupancy, as returned to clients.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub slots: Vec<SlotView>,
    pub status: RoomStatus,
}

impl RoomView {
    pub fn build(room: Room, assignments: &[RoomAssignment]) -> Self {
        let mut slots: Vec<SlotView> = (1..=room.max_guests)
            .map(|slot| SlotView {
                slot,
                attendee_id: assignments
                    .iter()
                    .find(|a| a.room_id == room.id && a.slot == slot)
                    .and_then(|a| a.attendee_id.clone()),
            })
            .collect();
        slots.sort_by_key(|s| s.slot);

        let occupied = slots.iter().filter(|s| s.attendee_id.is_some()).count();
        let status = RoomStatus::from_occupancy(occupied, room.max_guests);

        Self { room, slots, status }
    }
}
