use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use super::invite::Invite;

pub const TASK_BASIC: &str = "basic";
pub const TASK_PHONE: &str = "phone";
pub const TASK_ID: &str = "id";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: String,
    pub event_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub work_email: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub dietary_requirements: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub id_doc_url: Option<String>,
    pub phone_verified: bool,
    #[sqlx(rename = "tasks_json")]
    #[serde(rename = "tasks")]
    pub tasks: Json<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
}

impl Attendee {
    /// Seeds a new attendee from the invite that let the guest in.
    pub fn from_invite(invite: &Invite) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: invite.event_id.clone(),
            email: invite.email.clone(),
            first_name: invite.first_name.clone(),
            last_name: invite.last_name.clone(),
            phone: invite.phone.clone(),
            work_email: None,
            location: None,
            gender: None,
            dietary_requirements: None,
            accepted_at: None,
            id_doc_url: None,
            phone_verified: false,
            tasks: Json(Map::new()),
            created_at: Utc::now(),
        }
    }

    pub fn task_done(&self, key: &str) -> bool {
        self.tasks.0.get(key).is_some_and(is_truthy)
    }

    pub fn set_task(&mut self, key: &str, done: bool) {
        self.tasks.0.insert(key.to_string(), Value::Bool(done));
    }

    /// The basic registration form counts as complete once name and phone are filled in.
    pub fn has_basic_profile(&self) -> bool {
        [&self.first_name, &self.last_name, &self.phone]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}

/// JavaScript-style truthiness for the free-form task map.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness_follows_json_values() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("done")));
        assert!(is_truthy(&json!({})));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn basic_profile_requires_name_and_phone() {
        let invite = Invite::new("ev".into(), "a@x.com".into(), Default::default());
        let mut attendee = Attendee::from_invite(&invite);
        assert!(!attendee.has_basic_profile());

        attendee.first_name = Some("Ada".into());
        attendee.last_name = Some("Lovelace".into());
        attendee.phone = Some("   ".into());
        assert!(!attendee.has_basic_profile());

        attendee.phone = Some("+4912345".into());
        assert!(attendee.has_basic_profile());
    }
}
