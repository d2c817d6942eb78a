use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::models::invite::InviteContact;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub cover_image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl CreateInviteRequest {
    pub fn contact(&self) -> InviteContact {
        InviteContact {
            first_name: non_blank(&self.first_name),
            last_name: non_blank(&self.last_name),
            phone: non_blank(&self.phone),
            country_code: non_blank(&self.country_code),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInviteRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country_code: Option<String>,
}

impl UpdateInviteRequest {
    pub fn contact(&self) -> InviteContact {
        InviteContact {
            first_name: non_blank(&self.first_name),
            last_name: non_blank(&self.last_name),
            phone: non_blank(&self.phone),
            country_code: non_blank(&self.country_code),
        }
    }
}

#[derive(Deserialize)]
pub struct ImportInvitesRequest {
    pub rows: Vec<CreateInviteRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room_no: String,
    pub category: Option<String>,
    pub max_guests: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomRequest {
    pub room_no: Option<String>,
    pub category: Option<String>,
    pub max_guests: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoomRequest {
    pub room_id: String,
    pub slot: i32,
    pub attendee_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearSlotRequest {
    pub room_id: String,
    pub slot: i32,
}

#[derive(Deserialize)]
pub struct UnassignQuery {
    pub slot: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItineraryRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItineraryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateBroadcastRequest {
    pub title: String,
    pub body: String,
    pub channel: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOtpRequest {
    pub event_id: String,
    pub email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub event_id: String,
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub work_email: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub dietary_requirements: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyPhoneRequest {
    pub code: String,
}

pub fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
