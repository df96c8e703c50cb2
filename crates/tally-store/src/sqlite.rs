//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use tally_api::{AddOn, ClosedDateView, Service, SessionFilter, SessionRecord};
use tally_util::{format_date, parse_date, DeviceId, Money, SessionId};
use tracing::{debug, warn};

use crate::{Store, StoreError, StoreResult, SyncAction, SyncLogEntry};

const SESSION_COLUMNS: &str =
    "id, location, date, services_json, addons_json, tips_cents, review, rating, has_client_review";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Session records. Line items ride along as JSON, exactly
            -- as the clients author them; tips are held in cents.
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                location TEXT NOT NULL,
                date TEXT NOT NULL,
                services_json TEXT NOT NULL DEFAULT '[]',
                addons_json TEXT NOT NULL DEFAULT '[]',
                tips_cents INTEGER NOT NULL DEFAULT 0,
                review TEXT,
                rating INTEGER,
                has_client_review INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Closed-out dates
            CREATE TABLE IF NOT EXISTS closed_dates (
                date TEXT PRIMARY KEY,
                is_closed INTEGER NOT NULL DEFAULT 1,
                closed_at TEXT NOT NULL
            );

            -- Sync log (append-only)
            CREATE TABLE IF NOT EXISTS sync_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                action TEXT NOT NULL,
                session_count INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);
            CREATE INDEX IF NOT EXISTS idx_sessions_location ON sessions(location);
            CREATE INDEX IF NOT EXISTS idx_sync_log_device ON sync_log(device_id);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

type RawSession = (
    String,
    String,
    String,
    String,
    String,
    i64,
    Option<String>,
    Option<i32>,
    bool,
);

fn map_session_row(row: &Row) -> rusqlite::Result<RawSession> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn parse_session(raw: RawSession) -> StoreResult<SessionRecord> {
    let (id, location, date, services_json, addons_json, tips_cents, review, rating, has_client_review) =
        raw;

    let date =
        parse_date(&date).map_err(|e| StoreError::Database(format!("stored session: {}", e)))?;
    let services: Vec<Service> = serde_json::from_str(&services_json)?;
    let add_ons: Vec<AddOn> = serde_json::from_str(&addons_json)?;

    Ok(SessionRecord {
        id: SessionId::new(id),
        location,
        date,
        services,
        add_ons,
        tips: Money::from_cents(tips_cents),
        review,
        rating,
        has_client_review,
    })
}

fn parse_timestamp(s: &str) -> DateTime<Local> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .unwrap_or_else(|_| tally_util::now())
}

impl Store for SqliteStore {
    fn insert_session(&self, record: &SessionRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sessions WHERE id = ?",
                [record.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::Conflict(record.id.to_string()));
        }

        let now = tally_util::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sessions
                 (id, location, date, services_json, addons_json, tips_cents,
                  review, rating, has_client_review, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                record.id.as_str(),
                record.location,
                format_date(record.date),
                serde_json::to_string(&record.services)?,
                serde_json::to_string(&record.add_ons)?,
                record.tips.cents(),
                record.review,
                record.rating,
                record.has_client_review,
                now,
            ],
        )?;

        debug!(session_id = %record.id, date = %record.date, "Session inserted");
        Ok(())
    }

    fn update_session(&self, record: &SessionRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn.execute(
            "UPDATE sessions
             SET location = ?2,
                 date = ?3,
                 services_json = ?4,
                 addons_json = ?5,
                 tips_cents = ?6,
                 review = ?7,
                 rating = ?8,
                 has_client_review = ?9,
                 updated_at = ?10
             WHERE id = ?1",
            params![
                record.id.as_str(),
                record.location,
                format_date(record.date),
                serde_json::to_string(&record.services)?,
                serde_json::to_string(&record.add_ons)?,
                record.tips.cents(),
                record.review,
                record.rating,
                record.has_client_review,
                tally_util::now().to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(record.id.to_string()));
        }

        debug!(session_id = %record.id, "Session updated");
        Ok(())
    }

    fn upsert_session(&self, record: &SessionRecord) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = tally_util::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO sessions
                (id, location, date, services_json, addons_json, tips_cents,
                 review, rating, has_client_review, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(id)
            DO UPDATE SET
                location = excluded.location,
                date = excluded.date,
                services_json = excluded.services_json,
                addons_json = excluded.addons_json,
                tips_cents = excluded.tips_cents,
                review = excluded.review,
                rating = excluded.rating,
                has_client_review = excluded.has_client_review,
                updated_at = excluded.updated_at
            "#,
            params![
                record.id.as_str(),
                record.location,
                format_date(record.date),
                serde_json::to_string(&record.services)?,
                serde_json::to_string(&record.add_ons)?,
                record.tips.cents(),
                record.review,
                record.rating,
                record.has_client_review,
                now,
            ],
        )?;

        debug!(session_id = %record.id, "Session upserted");
        Ok(())
    }

    fn get_session(&self, id: &SessionId) -> StoreResult<Option<SessionRecord>> {
        let conn = self.conn.lock().unwrap();

        let raw = conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?", SESSION_COLUMNS),
                [id.as_str()],
                map_session_row,
            )
            .optional()?;

        raw.map(parse_session).transpose()
    }

    fn delete_session(&self, id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        let rows_affected = conn.execute("DELETE FROM sessions WHERE id = ?", [id.as_str()])?;
        if rows_affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!(session_id = %id, "Session deleted");
        Ok(())
    }

    fn list_sessions(&self, filter: &SessionFilter) -> StoreResult<Vec<SessionRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!("SELECT {} FROM sessions", SESSION_COLUMNS);
        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<String> = Vec::new();

        if let Some(start) = filter.start_date {
            clauses.push("date >= ?");
            args.push(format_date(start));
        }
        if let Some(end) = filter.end_date {
            clauses.push("date <= ?");
            args.push(format_date(end));
        }
        if let Some(location) = &filter.location {
            clauses.push("location = ?");
            args.push(location.clone());
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), map_session_row)?;

        let mut sessions = Vec::new();
        for raw in rows {
            sessions.push(parse_session(raw?)?);
        }
        Ok(sessions)
    }

    fn sessions_on(&self, date: NaiveDate) -> StoreResult<Vec<SessionRecord>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sessions WHERE date = ? ORDER BY id DESC",
            SESSION_COLUMNS
        ))?;
        let rows = stmt.query_map([format_date(date)], map_session_row)?;

        let mut sessions = Vec::new();
        for raw in rows {
            sessions.push(parse_session(raw?)?);
        }
        Ok(sessions)
    }

    fn session_count(&self) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn session_counts_by_date(&self) -> StoreResult<Vec<(NaiveDate, u64)>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT date, COUNT(id) FROM sessions GROUP BY date ORDER BY date",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((date, count))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (date_str, count) = row?;
            let date = parse_date(&date_str)
                .map_err(|e| StoreError::Database(format!("stored count: {}", e)))?;
            counts.push((date, count as u64));
        }
        Ok(counts)
    }

    fn close_date(&self, date: NaiveDate) -> StoreResult<ClosedDateView> {
        let conn = self.conn.lock().unwrap();
        let closed_at = tally_util::now();

        conn.execute(
            r#"
            INSERT INTO closed_dates (date, is_closed, closed_at)
            VALUES (?, 1, ?)
            ON CONFLICT(date)
            DO UPDATE SET is_closed = 1, closed_at = excluded.closed_at
            "#,
            params![format_date(date), closed_at.to_rfc3339()],
        )?;

        debug!(date = %date, "Date closed");
        Ok(ClosedDateView {
            date,
            is_closed: true,
            closed_at,
        })
    }

    fn reopen_date(&self, date: NaiveDate) -> StoreResult<ClosedDateView> {
        let conn = self.conn.lock().unwrap();

        let closed_at: Option<String> = conn
            .query_row(
                "SELECT closed_at FROM closed_dates WHERE date = ?",
                [format_date(date)],
                |row| row.get(0),
            )
            .optional()?;

        let closed_at = match closed_at {
            Some(s) => parse_timestamp(&s),
            None => return Err(StoreError::NotFound(format_date(date))),
        };

        conn.execute(
            "UPDATE closed_dates SET is_closed = 0 WHERE date = ?",
            [format_date(date)],
        )?;

        debug!(date = %date, "Date reopened");
        Ok(ClosedDateView {
            date,
            is_closed: false,
            closed_at,
        })
    }

    fn closed_dates(&self) -> StoreResult<Vec<ClosedDateView>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT date, closed_at FROM closed_dates WHERE is_closed = 1 ORDER BY date",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(0)?;
            let closed_at: String = row.get(1)?;
            Ok((date, closed_at))
        })?;

        let mut dates = Vec::new();
        for row in rows {
            let (date_str, closed_at) = row?;
            let date = parse_date(&date_str)
                .map_err(|e| StoreError::Database(format!("stored closed date: {}", e)))?;
            dates.push(ClosedDateView {
                date,
                is_closed: true,
                closed_at: parse_timestamp(&closed_at),
            });
        }
        Ok(dates)
    }

    fn append_sync(&self, mut entry: SyncLogEntry) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO sync_log (device_id, action, session_count, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.device_id.as_str(),
                entry.action.as_str(),
                entry.session_count as i64,
                entry.timestamp.to_rfc3339(),
            ],
        )?;

        entry.id = conn.last_insert_rowid();
        debug!(entry_id = entry.id, device_id = %entry.device_id, "Sync logged");
        Ok(())
    }

    fn last_sync(&self) -> StoreResult<Option<SyncLogEntry>> {
        let conn = self.conn.lock().unwrap();

        let raw: Option<(i64, String, String, i64, String)> = conn
            .query_row(
                "SELECT id, device_id, action, session_count, timestamp
                 FROM sync_log ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        Ok(raw.map(|(id, device_id, action, session_count, timestamp)| {
            let action = SyncAction::parse(&action).unwrap_or_else(|| {
                warn!(action = %action, "Unknown sync action in log, assuming upload");
                SyncAction::Upload
            });
            SyncLogEntry {
                id,
                device_id: DeviceId::new(device_id),
                action,
                session_count: session_count as u64,
                timestamp: parse_timestamp(&timestamp),
            }
        }))
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, location: &str, date: &str, tips: f64) -> SessionRecord {
        SessionRecord {
            id: SessionId::new(id),
            location: location.into(),
            date: date.parse().unwrap(),
            services: vec![Service {
                service_type: Some("massage".into()),
                duration: Some(60.0),
                rate: Some(90.0),
            }],
            add_ons: vec![],
            tips: Money::from_dollars(tips),
            review: None,
            rating: None,
            has_client_review: false,
        }
    }

    #[test]
    fn in_memory_store_is_healthy() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn insert_and_get_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut rec = record("s1", "halo", "2026-02-17", 20.0);
        rec.review = Some("great".into());
        rec.rating = Some(5);
        rec.has_client_review = true;

        store.insert_session(&rec).unwrap();

        let loaded = store.get_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(loaded, rec);

        assert!(store.get_session(&SessionId::new("nope")).unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record("s1", "halo", "2026-02-17", 0.0);

        store.insert_session(&rec).unwrap();
        let err = store.insert_session(&rec).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn update_replaces_or_fails() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record("s1", "halo", "2026-02-17", 0.0);

        let err = store.update_session(&rec).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.insert_session(&rec).unwrap();

        let mut changed = rec.clone();
        changed.location = "soul-bridge".into();
        changed.tips = Money::from_dollars(15.0);
        store.update_session(&changed).unwrap();

        let loaded = store.get_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(loaded, changed);
    }

    #[test]
    fn upsert_is_last_write_wins() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record("s1", "halo", "2026-02-17", 5.0);

        store.upsert_session(&rec).unwrap();

        let mut newer = rec.clone();
        newer.tips = Money::from_dollars(25.0);
        newer.date = "2026-02-18".parse().unwrap();
        store.upsert_session(&newer).unwrap();

        let loaded = store.get_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(loaded, newer);
        assert_eq!(store.session_count().unwrap(), 1);
    }

    #[test]
    fn delete_removes_or_fails() {
        let store = SqliteStore::in_memory().unwrap();
        let rec = record("s1", "halo", "2026-02-17", 0.0);
        store.insert_session(&rec).unwrap();

        store.delete_session(&SessionId::new("s1")).unwrap();
        assert!(store.get_session(&SessionId::new("s1")).unwrap().is_none());

        let err = store.delete_session(&SessionId::new("s1")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn listing_filters_and_orders() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_session(&record("s1", "halo", "2026-02-16", 0.0)).unwrap();
        store.insert_session(&record("s2", "soul-bridge", "2026-02-17", 0.0)).unwrap();
        store.insert_session(&record("s3", "halo", "2026-02-18", 0.0)).unwrap();

        // Unfiltered: newest date first
        let all = store.list_sessions(&SessionFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id.as_str(), "s3");
        assert_eq!(all[2].id.as_str(), "s1");

        // Date range
        let filter = SessionFilter {
            start_date: Some("2026-02-17".parse().unwrap()),
            end_date: Some("2026-02-18".parse().unwrap()),
            location: None,
        };
        let ranged = store.list_sessions(&filter).unwrap();
        assert_eq!(ranged.len(), 2);

        // Location
        let filter = SessionFilter {
            location: Some("halo".into()),
            ..Default::default()
        };
        let halo = store.list_sessions(&filter).unwrap();
        assert_eq!(halo.len(), 2);
        assert!(halo.iter().all(|s| s.location == "halo"));
    }

    #[test]
    fn sessions_on_one_date() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_session(&record("s1", "halo", "2026-02-17", 0.0)).unwrap();
        store.insert_session(&record("s2", "halo", "2026-02-17", 0.0)).unwrap();
        store.insert_session(&record("s3", "halo", "2026-02-18", 0.0)).unwrap();

        let day = store.sessions_on("2026-02-17".parse().unwrap()).unwrap();
        assert_eq!(day.len(), 2);
        // Newest first
        assert_eq!(day[0].id.as_str(), "s2");
    }

    #[test]
    fn counts_by_date() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert_session(&record("s1", "halo", "2026-02-17", 0.0)).unwrap();
        store.insert_session(&record("s2", "halo", "2026-02-17", 0.0)).unwrap();
        store.insert_session(&record("s3", "halo", "2026-02-18", 0.0)).unwrap();

        let counts = store.session_counts_by_date().unwrap();
        assert_eq!(
            counts,
            vec![
                ("2026-02-17".parse().unwrap(), 2),
                ("2026-02-18".parse().unwrap(), 1),
            ]
        );
        assert_eq!(store.session_count().unwrap(), 3);
    }

    #[test]
    fn closed_dates_lifecycle() {
        let store = SqliteStore::in_memory().unwrap();
        let date: NaiveDate = "2026-02-17".parse().unwrap();

        // Reopen before ever closing fails
        let err = store.reopen_date(date).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let closed = store.close_date(date).unwrap();
        assert!(closed.is_closed);

        // Closing again is idempotent
        store.close_date(date).unwrap();

        let listed = store.closed_dates().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].date, date);

        let reopened = store.reopen_date(date).unwrap();
        assert!(!reopened.is_closed);
        assert!(store.closed_dates().unwrap().is_empty());
    }

    #[test]
    fn sync_log_keeps_latest() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.last_sync().unwrap().is_none());

        store
            .append_sync(SyncLogEntry::new(DeviceId::new("phone"), SyncAction::Upload, 3))
            .unwrap();
        store
            .append_sync(SyncLogEntry::new(DeviceId::new("laptop"), SyncAction::Upload, 7))
            .unwrap();

        let last = store.last_sync().unwrap().unwrap();
        assert_eq!(last.device_id, DeviceId::new("laptop"));
        assert_eq!(last.session_count, 7);
        assert_eq!(last.action, SyncAction::Upload);
    }

    #[test]
    fn persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tallyd.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.insert_session(&record("s1", "halo", "2026-02-17", 20.0)).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let loaded = store.get_session(&SessionId::new("s1")).unwrap().unwrap();
        assert_eq!(loaded.tips, Money::from_dollars(20.0));
    }
}
