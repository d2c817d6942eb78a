//! Derives the single lifecycle label shown for a guest from its invite row and,
//! when the guest has signed in, its attendee row.

use serde::{Deserialize, Serialize};

use crate::domain::models::attendee::{Attendee, TASK_BASIC, TASK_ID, TASK_PHONE};
use crate::domain::models::invite::{Invite, InviteStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedStatus {
    NotInvited,
    Invited,
    EmailVerified,
    Accepted,
    Registered,
}

impl DerivedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivedStatus::NotInvited => "not_invited",
            DerivedStatus::Invited => "invited",
            DerivedStatus::EmailVerified => "email_verified",
            DerivedStatus::Accepted => "accepted",
            DerivedStatus::Registered => "registered",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "not_invited" => Some(DerivedStatus::NotInvited),
            "invited" => Some(DerivedStatus::Invited),
            "email_verified" => Some(DerivedStatus::EmailVerified),
            "accepted" => Some(DerivedStatus::Accepted),
            "registered" => Some(DerivedStatus::Registered),
            _ => None,
        }
    }
}

/// Rules run in order and a later rule overwrites an earlier one. The final
/// `sent` + phone-verified rule overrides the attendee rules.
pub fn derive_status(invite: &Invite, attendee: Option<&Attendee>) -> DerivedStatus {
    let invite_status = invite.status;
    let mut status = DerivedStatus::Invited;

    if invite_status == InviteStatus::Accepted {
        status = DerivedStatus::Accepted;
    }

    if invite_status == InviteStatus::Sent && invite.last_sent_at.is_some() {
        status = DerivedStatus::Invited;
    }

    if let Some(attendee) = attendee {
        if attendee.accepted_at.is_some() {
            status = if registration_complete(attendee) {
                DerivedStatus::Registered
            } else {
                DerivedStatus::Accepted
            };
        } else if attendee.phone_verified && status != DerivedStatus::Accepted {
            status = DerivedStatus::EmailVerified;
        }
    }

    if attendee.is_some_and(|a| a.phone_verified) && invite_status == InviteStatus::Sent {
        status = DerivedStatus::EmailVerified;
    }

    status
}

fn registration_complete(attendee: &Attendee) -> bool {
    [TASK_BASIC, TASK_PHONE, TASK_ID].iter().all(|task| attendee.task_done(task))
}
