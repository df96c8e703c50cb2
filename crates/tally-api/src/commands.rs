//! Command types for the tallyd protocol

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tally_util::{ClientId, DeviceId, SessionId};

use crate::{
    ClosedDateView, EarningsSummary, HealthStatus, SessionFilter, SessionRecord, SyncStatus,
    API_VERSION,
};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidDate,
    SessionNotFound,
    SessionExists,
    DateNotFound,
    StoreError,
    RateLimited,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// List sessions, optionally constrained by date range and location
    ListSessions {
        #[serde(default)]
        filter: SessionFilter,
    },

    /// All sessions recorded on one date, newest first
    GetSessionsOn { date: NaiveDate },

    /// Record a new session; fails if the id already exists
    CreateSession { record: SessionRecord },

    /// Replace an existing session wholesale
    UpdateSession { record: SessionRecord },

    /// Delete a session
    DeleteSession { session_id: SessionId },

    /// List currently-closed dates
    ListClosedDates,

    /// Mark a date closed (idempotent; refreshes the closed-at time)
    CloseDate { date: NaiveDate },

    /// Reopen a previously-closed date
    ReopenDate { date: NaiveDate },

    /// Upsert a batch of client-authored sessions, last write wins
    SyncSessions {
        /// Absent when an old client does not identify itself
        #[serde(default)]
        device_id: Option<DeviceId>,
        sessions: Vec<SessionRecord>,
    },

    /// Get sync bookkeeping
    GetSyncStatus,

    /// Earnings summary over the (optionally filtered) stored sessions
    GetStats {
        #[serde(default)]
        filter: SessionFilter,
    },

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Sessions(Vec<SessionRecord>),
    Session(SessionRecord),
    Deleted,
    ClosedDates(Vec<ClosedDateView>),
    ClosedDate(ClosedDateView),
    SyncReport {
        synced: u64,
        sessions: Vec<SessionRecord>,
        /// Earnings summary over the stored sessions after the upsert
        summary: Box<EarningsSummary>,
    },
    SyncStatus(SyncStatus),
    Stats(Box<EarningsSummary>),
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Health(HealthStatus),
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let req = Request::new(1, Command::Ping);
        let json = serde_json::to_string(&req).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, 1);
        assert!(matches!(parsed.command, Command::Ping));
    }

    #[test]
    fn command_filter_defaults_when_omitted() {
        let json = r#"{"request_id": 7, "api_version": 1, "command": {"type": "list_sessions"}}"#;
        let parsed: Request = serde_json::from_str(json).unwrap();

        match parsed.command {
            Command::ListSessions { filter } => assert!(filter.is_empty()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn response_serialization() {
        let resp = Response::success(3, ResponsePayload::Deleted);
        let json = serde_json::to_string(&resp).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, 3);
        assert!(matches!(
            parsed.result,
            ResponseResult::Ok(ResponsePayload::Deleted)
        ));
    }

    #[test]
    fn error_response_serialization() {
        let resp = Response::error(
            4,
            ErrorInfo::new(ErrorCode::SessionNotFound, "Session not found"),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("session_not_found"));
    }
}
