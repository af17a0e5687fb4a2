//! crates/event_journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AuthSession, Event, EventPatch, EventRecord, EventStats, EventStatus, EventWithRecords,
    NewEvent, NewEventRecord, PeriodEvent, Profile, Role, UserCredentials,
};
use crate::period::PeriodKind;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The data-access contract over the `events`, `event_records`, `profiles`,
/// `users` and `auth_sessions` tables.
///
/// Unless noted otherwise, event queries are scoped to the given user and
/// sorted by `updated_at` descending; record queries are sorted by
/// `created_at` ascending.
#[async_trait]
pub trait EventStore: Send + Sync {
    // --- Auth ---

    /// Creates a user with pre-hashed credentials. The matching profile row
    /// is created by a database trigger, which also promotes the first
    /// registrant to admin.
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<Profile>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()>;

    /// Validates a session id, returning the owning user id. Expired or
    /// unknown sessions fail with `Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Events ---

    async fn events_for_user(&self, user_id: Uuid) -> PortResult<Vec<Event>>;

    async fn events_by_category(&self, user_id: Uuid, category: &str) -> PortResult<Vec<Event>>;

    async fn events_by_status(&self, user_id: Uuid, status: EventStatus)
        -> PortResult<Vec<Event>>;

    /// Events whose `created_at` falls inside `[start, end]`.
    async fn events_by_date_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Event>>;

    async fn event_by_id(&self, event_id: Uuid) -> PortResult<Option<Event>>;

    async fn create_event(&self, user_id: Uuid, input: NewEvent) -> PortResult<Event>;

    async fn update_event(&self, event_id: Uuid, patch: EventPatch) -> PortResult<Event>;

    /// Deletes an event; its records are removed by the cascade on
    /// `event_records.event_id`.
    async fn delete_event(&self, event_id: Uuid) -> PortResult<()>;

    // --- Records ---

    async fn records_for_event(&self, event_id: Uuid) -> PortResult<Vec<EventRecord>>;

    async fn record_by_id(&self, record_id: Uuid) -> PortResult<Option<EventRecord>>;

    /// Inserts a record, then touches the parent event's `updated_at` to
    /// now. The two writes are not transactional: a failure between them
    /// leaves the parent timestamp stale but corrupts nothing.
    async fn create_record(&self, input: NewEventRecord) -> PortResult<EventRecord>;

    async fn update_record_summary(&self, record_id: Uuid, ai_summary: &str) -> PortResult<()>;

    async fn delete_record(&self, record_id: Uuid) -> PortResult<()>;

    // --- Aggregates ---

    /// Two sequential reads (event, then records) composed into an
    /// aggregate with a derived record count.
    async fn event_with_records(&self, event_id: Uuid) -> PortResult<Option<EventWithRecords>>;

    async fn events_with_records_by_date_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<EventWithRecords>>;

    /// Distinct non-empty category values across a user's events.
    async fn all_categories(&self, user_id: Uuid) -> PortResult<Vec<String>>;

    async fn event_stats(&self, user_id: Uuid) -> PortResult<EventStats>;

    // --- Admin ---

    /// All profiles, newest first. Not scoped to a user.
    async fn list_profiles(&self) -> PortResult<Vec<Profile>>;

    async fn profile_by_id(&self, user_id: Uuid) -> PortResult<Option<Profile>>;

    async fn update_role(&self, user_id: Uuid, role: Role) -> PortResult<()>;

    /// Deletes all of a user's events (records cascade).
    async fn delete_user_events(&self, user_id: Uuid) -> PortResult<()>;

    async fn delete_profile(&self, user_id: Uuid) -> PortResult<()>;

    /// Removes the auth identity: credentials plus any open sessions.
    async fn delete_auth_user(&self, user_id: Uuid) -> PortResult<()>;
}

/// Normalizes one free-text progress entry into a concise summary.
#[async_trait]
pub trait RecordSummaryService: Send + Sync {
    async fn summarize_record(&self, raw_text: &str) -> PortResult<String>;
}

/// Produces the closing retrospective for an event from its title and full
/// ordered record list.
#[async_trait]
pub trait ClosureSummaryService: Send + Sync {
    async fn summarize_event(&self, title: &str, records: &[EventRecord]) -> PortResult<String>;
}

/// Produces a structured report over all events in a named period.
#[async_trait]
pub trait PeriodSummaryService: Send + Sync {
    async fn summarize_period(
        &self,
        kind: PeriodKind,
        start_label: &str,
        end_label: &str,
        events: &[PeriodEvent],
    ) -> PortResult<String>;
}
