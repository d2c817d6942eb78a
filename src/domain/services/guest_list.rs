use std::collections::HashMap;

use serde::Serialize;

use crate::domain::models::attendee::Attendee;
use crate::domain::models::invite::Invite;
use crate::domain::services::guest_status::{derive_status, DerivedStatus};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

/// An invite joined with its attendee (matched by email) and the derived status.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    #[serde(flatten)]
    pub invite: Invite,
    pub derived_status: DerivedStatus,
    pub attendee: Option<Attendee>,
}

impl Guest {
    fn display_name_key(&self) -> String {
        format!(
            "{} {}",
            self.invite.first_name.as_deref().unwrap_or(""),
            self.invite.last_name.as_deref().unwrap_or("")
        )
        .to_lowercase()
    }

    fn matches_search(&self, needle: &str) -> bool {
        let fields = [
            Some(self.invite.email.as_str()),
            self.invite.first_name.as_deref(),
            self.invite.last_name.as_deref(),
        ];
        fields.into_iter().flatten().any(|f| f.to_lowercase().contains(needle))
    }
}

/// Joins every invite of an event with the attendee sharing its exact email.
pub fn build_guests(invites: Vec<Invite>, attendees: Vec<Attendee>) -> Vec<Guest> {
    let mut by_email: HashMap<String, Attendee> = attendees
        .into_iter()
        .map(|a| (a.email.clone(), a))
        .collect();

    invites
        .into_iter()
        .map(|invite| {
            let attendee = by_email.remove(&invite.email);
            let derived_status = derive_status(&invite, attendee.as_ref());
            Guest { invite, derived_status, attendee }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuestSort {
    #[default]
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
    Status,
}

impl GuestSort {
    /// Unknown keys fall back to `Newest`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("oldest") => GuestSort::Oldest,
            Some("name_asc") => GuestSort::NameAsc,
            Some("name_desc") => GuestSort::NameDesc,
            Some("status") => GuestSort::Status,
            _ => GuestSort::Newest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuestListParams {
    pub search: Option<String>,
    pub statuses: Vec<DerivedStatus>,
    pub sort: GuestSort,
    pub page: usize,
    pub page_size: usize,
}

impl Default for GuestListParams {
    fn default() -> Self {
        Self {
            search: None,
            statuses: Vec::new(),
            sort: GuestSort::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl GuestListParams {
    pub fn from_raw(
        q: Option<&str>,
        status: Option<&str>,
        sort: Option<&str>,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> Self {
        let search = q
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let statuses = status
            .map(|raw| raw.split(',').filter_map(DerivedStatus::parse).collect())
            .unwrap_or_default();

        Self {
            search,
            statuses,
            sort: GuestSort::parse(sort),
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// search -> status filter -> sort -> slice. Never fails; out-of-range pages are empty.
pub fn list_guests(guests: Vec<Guest>, params: &GuestListParams) -> Page<Guest> {
    let mut filtered: Vec<Guest> = guests
        .into_iter()
        .filter(|g| params.search.as_deref().is_none_or(|needle| g.matches_search(needle)))
        .filter(|g| params.statuses.is_empty() || params.statuses.contains(&g.derived_status))
        .collect();

    match params.sort {
        GuestSort::Newest => filtered.sort_by(|a, b| b.invite.created_at.cmp(&a.invite.created_at)),
        GuestSort::Oldest => filtered.sort_by(|a, b| a.invite.created_at.cmp(&b.invite.created_at)),
        GuestSort::NameAsc => filtered.sort_by_key(|g| g.display_name_key()),
        GuestSort::NameDesc => filtered.sort_by(|a, b| b.display_name_key().cmp(&a.display_name_key())),
        GuestSort::Status => filtered.sort_by(|a, b| a.derived_status.as_str().cmp(b.derived_status.as_str())),
    }

    paginate(filtered, params.page, params.page_size)
}

pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();

    Page { items, total, page, page_size, total_pages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::invite::{InviteContact, InviteStatus};
    use chrono::{Duration, Utc};

    fn invite(email: &str, first: &str, last: &str, age_minutes: i64) -> Invite {
        let mut invite = Invite::new(
            "ev".into(),
            email.into(),
            InviteContact {
                first_name: Some(first.into()),
                last_name: Some(last.into()),
                ..Default::default()
            },
        );
        invite.created_at = Utc::now() - Duration::minutes(age_minutes);
        invite
    }

    fn guests(n: usize) -> Vec<Guest> {
        let invites = (0..n)
            .map(|i| invite(&format!("g{}@x.com", i), "G", &i.to_string(), i as i64))
            .collect();
        build_guests(invites, vec![])
    }

    #[test]
    fn second_page_holds_the_remainder() {
        let params = GuestListParams { page: 2, ..Default::default() };
        let page = list_guests(guests(25), &params);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let params = GuestListParams { page: 3, ..Default::default() };
        let page = list_guests(guests(25), &params);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let params = GuestListParams { search: Some("nobody".into()), ..Default::default() };
        let page = list_guests(guests(3), &params);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn name_asc_orders_by_first_then_last() {
        let list = build_guests(
            vec![invite("b@x.com", "Bob", "Z", 0), invite("a@x.com", "Alice", "A", 1)],
            vec![],
        );
        let params = GuestListParams { sort: GuestSort::NameAsc, ..Default::default() };
        let page = list_guests(list, &params);
        let names: Vec<_> = page.items.iter().map(|g| g.invite.first_name.clone().unwrap()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);

        let list = build_guests(
            vec![invite("a@x.com", "Alice", "A", 1), invite("b@x.com", "Bob", "Z", 0)],
            vec![],
        );
        let params = GuestListParams { sort: GuestSort::NameDesc, ..Default::default() };
        let page = list_guests(list, &params);
        assert_eq!(page.items[0].invite.first_name.as_deref(), Some("Bob"));
    }

    #[test]
    fn newest_and_oldest_use_created_at() {
        let list = build_guests(
            vec![invite("old@x.com", "O", "", 60), invite("new@x.com", "N", "", 1)],
            vec![],
        );
        let newest = list_guests(list.clone(), &GuestListParams::default());
        assert_eq!(newest.items[0].invite.email, "new@x.com");

        let params = GuestListParams { sort: GuestSort::Oldest, ..Default::default() };
        let oldest = list_guests(list, &params);
        assert_eq!(oldest.items[0].invite.email, "old@x.com");
    }

    #[test]
    fn status_sort_is_lexical() {
        let mut accepted = invite("acc@x.com", "A", "", 0);
        accepted.status = InviteStatus::Accepted;
        let list = build_guests(vec![invite("inv@x.com", "I", "", 0), accepted], vec![]);

        let params = GuestListParams { sort: GuestSort::Status, ..Default::default() };
        let page = list_guests(list, &params);
        let statuses: Vec<_> = page.items.iter().map(|g| g.derived_status).collect();
        assert_eq!(statuses, vec![DerivedStatus::Accepted, DerivedStatus::Invited]);
    }

    #[test]
    fn search_runs_before_status_filter() {
        let mut accepted = invite("carol@corp.com", "Carol", "Smith", 0);
        accepted.status = InviteStatus::Accepted;
        let list = build_guests(
            vec![accepted, invite("dave@corp.com", "Dave", "Smith", 0), invite("erin@else.com", "Erin", "Jones", 0)],
            vec![],
        );

        let params = GuestListParams::from_raw(Some(" SMITH "), Some("accepted,bogus"), None, None, None);
        let page = list_guests(list, &params);
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].invite.email, "carol@corp.com");
    }

    #[test]
    fn attendees_match_by_exact_email() {
        let inv = invite("a@x.com", "A", "", 0);
        let mut att = Attendee::from_invite(&inv);
        att.phone_verified = true;
        let mut other = att.clone();
        other.email = "A@X.COM".into();

        let list = build_guests(vec![inv], vec![other]);
        assert!(list[0].attendee.is_none());
        assert_eq!(list[0].derived_status, DerivedStatus::Invited);
    }

    #[test]
    fn raw_params_are_clamped() {
        let params = GuestListParams::from_raw(None, None, Some("whatever"), Some(0), Some(1000));
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, MAX_PAGE_SIZE);
        assert_eq!(params.sort, GuestSort::Newest);
    }
}
