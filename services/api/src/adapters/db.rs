//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `EventStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_journal_core::domain::{
    AuthSession, Event, EventPatch, EventRecord, EventStats, EventStatus, EventWithRecords,
    NewEvent, NewEventRecord, Profile, Role, UserCredentials, DEFAULT_CATEGORY, DEFAULT_IMPORTANCE,
};
use event_journal_core::ports::{EventStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `EventStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Deduplicates raw category values, dropping empties and preserving
/// first-seen order.
fn dedup_categories(raw: Vec<String>) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for category in raw {
        if !category.is_empty() && !categories.contains(&category) {
            categories.push(category);
        }
    }
    categories
}

/// Counts raw status values into the per-user stats aggregate.
fn count_stats(statuses: &[String]) -> EventStats {
    let ongoing = statuses.iter().filter(|s| s.as_str() == "ongoing").count();
    EventStats {
        total: statuses.len(),
        ongoing,
        closed: statuses.len() - ongoing,
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    category: String,
    status: String,
    importance: i32,
    summary: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRow {
    fn to_domain(self) -> PortResult<Event> {
        let status = EventStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Event {} has unknown status '{}'", self.id, self.status))
        })?;
        Ok(Event {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            category: self.category,
            status,
            importance: self.importance,
            summary: self.summary,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct EventRecordRow {
    id: Uuid,
    event_id: Uuid,
    original_content: String,
    ai_summary: String,
    created_at: DateTime<Utc>,
}

impl EventRecordRow {
    fn to_domain(self) -> EventRecord {
        EventRecord {
            id: self.id,
            event_id: self.event_id,
            original_content: self.original_content,
            ai_summary: self.ai_summary,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl ProfileRow {
    fn to_domain(self) -> PortResult<Profile> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            PortError::Unexpected(format!("Profile {} has unknown role '{}'", self.id, self.role))
        })?;
        Ok(Profile {
            id: self.id,
            username: self.username,
            role,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    id: Uuid,
    username: String,
    hashed_password: String,
}

fn events_to_domain(rows: Vec<EventRow>) -> PortResult<Vec<Event>> {
    rows.into_iter().map(EventRow::to_domain).collect()
}

const EVENT_COLUMNS: &str =
    "id, user_id, title, description, category, status, importance, summary, created_at, updated_at";

//=========================================================================================
// `EventStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl EventStore for PgStore {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<Profile> {
        let user_id: Uuid =
            sqlx::query_scalar("INSERT INTO users (username, hashed_password) VALUES ($1, $2) RETURNING id")
                .bind(username)
                .bind(hashed_password)
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;

        // The insert trigger created the profile row; read it back so the
        // caller sees the assigned role (first registrant becomes admin).
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, role, created_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        row.to_domain()
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, username, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User '{}' not found", username)),
            _ => unexpected(e),
        })?;

        Ok(UserCredentials {
            user_id: row.id,
            username: row.username,
            hashed_password: row.hashed_password,
        })
    }

    async fn create_auth_session(&self, session: &AuthSession) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.id)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Uuid = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })?;
        Ok(user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn events_for_user(&self, user_id: Uuid) -> PortResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        events_to_domain(rows)
    }

    async fn events_by_category(&self, user_id: Uuid, category: &str) -> PortResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 AND category = $2 \
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        events_to_domain(rows)
    }

    async fn events_by_status(
        &self,
        user_id: Uuid,
        status: EventStatus,
    ) -> PortResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 AND status = $2 \
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        events_to_domain(rows)
    }

    async fn events_by_date_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE user_id = $1 \
             AND created_at >= $2 AND created_at <= $3 ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        events_to_domain(rows)
    }

    async fn event_by_id(&self, event_id: Uuid) -> PortResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(EventRow::to_domain).transpose()
    }

    async fn create_event(&self, user_id: Uuid, input: NewEvent) -> PortResult<Event> {
        let category = input
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let importance = input.importance.unwrap_or(DEFAULT_IMPORTANCE);

        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (user_id, title, description, category, importance) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&category)
        .bind(importance)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        row.to_domain()
    }

    async fn update_event(&self, event_id: Uuid, patch: EventPatch) -> PortResult<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET \
               title = COALESCE($2, title), \
               description = COALESCE($3, description), \
               category = COALESCE($4, category), \
               importance = COALESCE($5, importance), \
               status = COALESCE($6, status), \
               summary = COALESCE($7, summary), \
               updated_at = now() \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event_id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(&patch.category)
        .bind(patch.importance)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(&patch.summary)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Event {} not found", event_id)),
            _ => unexpected(e),
        })?;
        row.to_domain()
    }

    async fn delete_event(&self, event_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn records_for_event(&self, event_id: Uuid) -> PortResult<Vec<EventRecord>> {
        let rows = sqlx::query_as::<_, EventRecordRow>(
            "SELECT id, event_id, original_content, ai_summary, created_at \
             FROM event_records WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(EventRecordRow::to_domain).collect())
    }

    async fn record_by_id(&self, record_id: Uuid) -> PortResult<Option<EventRecord>> {
        let row = sqlx::query_as::<_, EventRecordRow>(
            "SELECT id, event_id, original_content, ai_summary, created_at \
             FROM event_records WHERE id = $1",
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(EventRecordRow::to_domain))
    }

    async fn create_record(&self, input: NewEventRecord) -> PortResult<EventRecord> {
        let row = sqlx::query_as::<_, EventRecordRow>(
            "INSERT INTO event_records (event_id, original_content, ai_summary) \
             VALUES ($1, $2, $3) RETURNING id, event_id, original_content, ai_summary, created_at",
        )
        .bind(input.event_id)
        .bind(&input.original_content)
        .bind(&input.ai_summary)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        // Second, separate write: touch the parent's updated_at. Not
        // transactional with the insert; a failure here leaves the
        // timestamp stale but the record intact.
        sqlx::query("UPDATE events SET updated_at = now() WHERE id = $1")
            .bind(input.event_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(row.to_domain())
    }

    async fn update_record_summary(&self, record_id: Uuid, ai_summary: &str) -> PortResult<()> {
        sqlx::query("UPDATE event_records SET ai_summary = $1 WHERE id = $2")
            .bind(ai_summary)
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_record(&self, record_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM event_records WHERE id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn event_with_records(&self, event_id: Uuid) -> PortResult<Option<EventWithRecords>> {
        let Some(event) = self.event_by_id(event_id).await? else {
            return Ok(None);
        };
        let records = self.records_for_event(event_id).await?;
        Ok(Some(EventWithRecords::new(event, records)))
    }

    async fn events_with_records_by_date_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<EventWithRecords>> {
        let events = self.events_by_date_range(user_id, start, end).await?;
        let mut aggregates = Vec::with_capacity(events.len());
        for event in events {
            let records = self.records_for_event(event.id).await?;
            aggregates.push(EventWithRecords::new(event, records));
        }
        Ok(aggregates)
    }

    async fn all_categories(&self, user_id: Uuid) -> PortResult<Vec<String>> {
        let raw: Vec<String> = sqlx::query_scalar("SELECT category FROM events WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(dedup_categories(raw))
    }

    async fn event_stats(&self, user_id: Uuid) -> PortResult<EventStats> {
        let statuses: Vec<String> = sqlx::query_scalar("SELECT status FROM events WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(count_stats(&statuses))
    }

    async fn list_profiles(&self) -> PortResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, role, created_at FROM profiles ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        rows.into_iter().map(ProfileRow::to_domain).collect()
    }

    async fn profile_by_id(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, username, role, created_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        row.map(ProfileRow::to_domain).transpose()
    }

    async fn update_role(&self, user_id: Uuid, role: Role) -> PortResult<()> {
        sqlx::query("UPDATE profiles SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_user_events(&self, user_id: Uuid) -> PortResult<()> {
        // Records go with their events via the cascade.
        sqlx::query("DELETE FROM events WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_profile(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_auth_user(&self, user_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn categories_are_deduplicated_without_empties() {
        let raw = strings(&["工作", "", "生活", "工作", "生活", "学习"]);
        assert_eq!(dedup_categories(raw), strings(&["工作", "生活", "学习"]));
    }

    #[test]
    fn stats_count_ongoing_and_closed() {
        let statuses = strings(&["ongoing", "closed", "ongoing"]);
        let stats = count_stats(&statuses);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.ongoing, 2);
        assert_eq!(stats.closed, 1);
    }

    #[test]
    fn stats_of_no_events_are_zero() {
        let stats = count_stats(&[]);
        assert_eq!((stats.total, stats.ongoing, stats.closed), (0, 0, 0));
    }
}
