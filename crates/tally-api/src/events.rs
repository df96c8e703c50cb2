//! Event types for tallyd -> client streaming
//!
//! Subscribed clients (the desktop mirror in particular) keep their
//! local copy of the data current by applying these as they arrive.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tally_util::{DeviceId, SessionId};

use crate::{SessionRecord, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: tally_util::now(),
            payload,
        }
    }
}

/// All possible events from the service to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A session was recorded
    SessionCreated { record: SessionRecord },

    /// A session was replaced
    SessionUpdated { record: SessionRecord },

    /// A session was deleted
    SessionDeleted { session_id: SessionId },

    /// A date was marked closed
    DateClosed { date: NaiveDate },

    /// A closed date was reopened
    DateReopened { date: NaiveDate },

    /// A device finished a sync upload
    SyncCompleted { device_id: DeviceId, synced: u64 },

    /// Service is shutting down
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(EventPayload::SessionDeleted {
            session_id: SessionId::new("1739812345-abc"),
        });

        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_version, API_VERSION);
        assert!(matches!(parsed.payload, EventPayload::SessionDeleted { .. }));
    }

    #[test]
    fn sync_event_carries_count() {
        let event = Event::new(EventPayload::SyncCompleted {
            device_id: DeviceId::new("phone"),
            synced: 12,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("sync_completed"));
        assert!(json.contains("12"));
    }
}
