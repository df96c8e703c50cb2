//! Sync log entry types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tally_api::LastSyncView;
use tally_util::DeviceId;

/// Direction of a sync exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Upload,
    Download,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Upload => "upload",
            SyncAction::Download => "download",
        }
    }

    pub fn parse(s: &str) -> Option<SyncAction> {
        match s {
            "upload" => Some(SyncAction::Upload),
            "download" => Some(SyncAction::Download),
            _ => None,
        }
    }
}

/// One sync exchange with a device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    /// Unique entry ID, assigned by the store
    pub id: i64,

    pub device_id: DeviceId,

    pub action: SyncAction,

    /// Number of session records in the exchange
    pub session_count: u64,

    pub timestamp: DateTime<Local>,
}

impl SyncLogEntry {
    pub fn new(device_id: DeviceId, action: SyncAction, session_count: u64) -> Self {
        Self {
            id: 0, // Will be set by store
            device_id,
            action,
            session_count,
            timestamp: tally_util::now(),
        }
    }

    /// Project into the API view used by sync-status responses
    pub fn to_view(&self) -> LastSyncView {
        LastSyncView {
            device_id: self.device_id.clone(),
            session_count: self.session_count,
            timestamp: self.timestamp,
        }
    }
}
