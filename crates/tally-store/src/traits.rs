//! Store trait definitions

use chrono::NaiveDate;
use tally_api::{ClosedDateView, SessionFilter, SessionRecord};
use tally_util::SessionId;

use crate::{StoreResult, SyncLogEntry};

/// Main store trait
pub trait Store: Send + Sync {
    // Sessions

    /// Record a new session. Fails with `Conflict` if the id exists.
    fn insert_session(&self, record: &SessionRecord) -> StoreResult<()>;

    /// Replace an existing session. Fails with `NotFound` if absent.
    fn update_session(&self, record: &SessionRecord) -> StoreResult<()>;

    /// Insert or replace, last write wins. Used by sync.
    fn upsert_session(&self, record: &SessionRecord) -> StoreResult<()>;

    /// Fetch one session by id
    fn get_session(&self, id: &SessionId) -> StoreResult<Option<SessionRecord>>;

    /// Delete a session. Fails with `NotFound` if absent.
    fn delete_session(&self, id: &SessionId) -> StoreResult<()>;

    /// List sessions matching the filter, newest date first
    fn list_sessions(&self, filter: &SessionFilter) -> StoreResult<Vec<SessionRecord>>;

    /// All sessions on one date, newest first
    fn sessions_on(&self, date: NaiveDate) -> StoreResult<Vec<SessionRecord>>;

    /// Total number of stored sessions
    fn session_count(&self) -> StoreResult<u64>;

    /// Session count per date, ascending by date
    fn session_counts_by_date(&self) -> StoreResult<Vec<(NaiveDate, u64)>>;

    // Closed dates

    /// Mark a date closed. Idempotent; refreshes the closed-at time.
    fn close_date(&self, date: NaiveDate) -> StoreResult<ClosedDateView>;

    /// Reopen a date. Fails with `NotFound` if it was never closed.
    fn reopen_date(&self, date: NaiveDate) -> StoreResult<ClosedDateView>;

    /// Currently-closed dates, ascending
    fn closed_dates(&self) -> StoreResult<Vec<ClosedDateView>>;

    // Sync log

    /// Append a sync log entry
    fn append_sync(&self, entry: SyncLogEntry) -> StoreResult<()>;

    /// Most recent sync log entry
    fn last_sync(&self) -> StoreResult<Option<SyncLogEntry>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
