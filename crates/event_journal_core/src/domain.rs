//! crates/event_journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format
//! beyond plain serde derives for the API surface.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned to events created without one.
pub const DEFAULT_CATEGORY: &str = "未分类";

/// Importance assigned to events created without one.
pub const DEFAULT_IMPORTANCE: i32 = 3;

/// Lifecycle status of an event. Closure is one-way: no operation in the
/// system transitions an event back to `Ongoing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Ongoing,
    Closed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Ongoing => "ongoing",
            EventStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ongoing" => Some(EventStatus::Ongoing),
            "closed" => Some(EventStatus::Closed),
            _ => None,
        }
    }

    /// Human-readable label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Ongoing => "进行中",
            EventStatus::Closed => "已闭环",
        }
    }
}

/// A tracked topic with an ongoing/closed lifecycle.
///
/// Invariant: `summary` is populated only once `status` is `Closed`.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: EventStatus,
    pub importance: i32,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A timestamped progress entry attached to an event, carrying both the raw
/// user text and the AI-normalized version of it.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub event_id: Uuid,
    pub original_content: String,
    pub ai_summary: String,
    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// The text a reader should see: the normalized summary when the AI
    /// produced one, the raw content otherwise.
    pub fn display_text(&self) -> &str {
        if self.ai_summary.trim().is_empty() {
            &self.original_content
        } else {
            &self.ai_summary
        }
    }
}

/// An event together with its full ordered record list.
#[derive(Debug, Clone, Serialize)]
pub struct EventWithRecords {
    #[serde(flatten)]
    pub event: Event,
    pub records: Vec<EventRecord>,
    pub record_count: usize,
}

impl EventWithRecords {
    pub fn new(event: Event, records: Vec<EventRecord>) -> Self {
        let record_count = records.len();
        Self {
            event,
            records,
            record_count,
        }
    }
}

/// Account role. The first registrant becomes an admin via a database
/// trigger; everyone after that starts as a plain user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Public profile of an account. `id` equals the auth user id.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub username: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Issues a fresh session for a user: a random id, expiring
    /// `valid_days` after `now`.
    pub fn issue(user_id: Uuid, now: DateTime<Utc>, valid_days: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(valid_days),
        }
    }
}

/// Per-user event counts, computed from a single read.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub ongoing: usize,
    pub closed: usize,
}

/// Input for creating an event. Missing category/importance fall back to
/// [`DEFAULT_CATEGORY`] and [`DEFAULT_IMPORTANCE`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub importance: Option<i32>,
}

/// Partial update of an event; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub importance: Option<i32>,
    pub status: Option<EventStatus>,
    pub summary: Option<String>,
}

/// Input for appending a progress record to an event.
#[derive(Debug, Clone)]
pub struct NewEventRecord {
    pub event_id: Uuid,
    pub original_content: String,
    pub ai_summary: String,
}

/// A flattened event as fed to the period summarization call.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodEvent {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: EventStatus,
    pub importance: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub records: Vec<PeriodRecord>,
}

/// One progress entry inside a [`PeriodEvent`]: the AI summary when present,
/// the raw content otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodRecord {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl PeriodEvent {
    /// Flattens an event and its records into the shape the period
    /// summarizer consumes.
    pub fn from_event(source: &EventWithRecords) -> Self {
        Self {
            title: source.event.title.clone(),
            description: source.event.description.clone(),
            category: source.event.category.clone(),
            status: source.event.status,
            importance: source.event.importance,
            created_at: source.event.created_at,
            updated_at: source.event.updated_at,
            records: source
                .records
                .iter()
                .map(|r| PeriodRecord {
                    text: r.display_text().to_string(),
                    created_at: r.created_at,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(original: &str, summary: &str) -> EventRecord {
        EventRecord {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            original_content: original.to_string(),
            ai_summary: summary.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn display_text_prefers_ai_summary() {
        assert_eq!(record("raw", "summary").display_text(), "summary");
    }

    #[test]
    fn display_text_falls_back_to_original() {
        assert_eq!(record("raw", "").display_text(), "raw");
        assert_eq!(record("raw", "   ").display_text(), "raw");
    }

    #[test]
    fn issued_sessions_expire_after_the_given_days() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let session = AuthSession::issue(user_id, now, 30);
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.expires_at, now + Duration::days(30));

        let other = AuthSession::issue(user_id, now, 30);
        assert_ne!(session.id, other.id);
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(EventStatus::parse("ongoing"), Some(EventStatus::Ongoing));
        assert_eq!(EventStatus::parse("closed"), Some(EventStatus::Closed));
        assert_eq!(EventStatus::parse("reopened"), None);
        assert_eq!(EventStatus::Closed.as_str(), "closed");
    }
}
