//! Shared types for the tallyd API
//!
//! The session wire model matches the JSON the existing collaborators
//! produce (camelCase keys, dates as `YYYY-MM-DD`, money as dollar
//! numbers). Numeric line-item fields deserialize leniently: a missing,
//! null, or non-numeric value degrades to "absent" rather than failing,
//! because the calculator's contract is that malformed line items
//! contribute zero, not an error.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tally_util::{DeviceId, Money, SessionId};

mod lenient {
    //! Tolerant deserializers for numeric wire fields
    use serde::{Deserialize, Deserializer};
    use tally_util::Money;

    pub fn money<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_f64().map(Money::from_dollars).unwrap_or(Money::ZERO))
    }

    pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_f64())
    }
}

/// One recorded visit: the services rendered, flat-priced add-ons,
/// tips, and optional review annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Client-generated identifier; uniqueness enforced by the store
    pub id: SessionId,

    /// Business location label (e.g. "soul-bridge", "halo"). Unknown
    /// labels are accepted; the configured set is advisory.
    pub location: String,

    /// Business date; multiple sessions may share a date
    pub date: NaiveDate,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default)]
    pub add_ons: Vec<AddOn>,

    #[serde(default, deserialize_with = "lenient::money")]
    pub tips: Money,

    // Annotations; never used in earnings math
    #[serde(default)]
    pub review: Option<String>,

    #[serde(default)]
    pub rating: Option<i32>,

    #[serde(default)]
    pub has_client_review: bool,
}

/// A billable line item within a session, billed by duration at an
/// hourly rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Free-text category label
    #[serde(default, rename = "type")]
    pub service_type: Option<String>,

    /// Duration in minutes
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub duration: Option<f64>,

    /// Hourly rate in dollars
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub rate: Option<f64>,
}

/// A flat-priced extra within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOn {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::money")]
    pub price: Money,
}

/// Optional constraints when listing or summarizing sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl SessionFilter {
    pub fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none() && self.location.is_none()
    }

    /// In-memory filtering, for callers working from a backup file
    /// rather than the store.
    pub fn matches(&self, record: &SessionRecord) -> bool {
        if let Some(start) = self.start_date {
            if record.date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.date > end {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if &record.location != location {
                return false;
            }
        }
        true
    }
}

/// A date marked closed (or reopened again) for bookkeeping.
/// Closed dates never affect earnings math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedDateView {
    pub date: NaiveDate,
    pub is_closed: bool,
    pub closed_at: DateTime<Local>,
}

/// The most recent sync, as recorded in the sync log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSyncView {
    pub device_id: DeviceId,
    pub session_count: u64,
    pub timestamp: DateTime<Local>,
}

/// Sync bookkeeping snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub total_sessions: u64,
    pub sessions_by_date: BTreeMap<NaiveDate, u64>,
    pub last_sync: Option<LastSyncView>,
}

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub live: bool,
    pub ready: bool,
    pub store_ok: bool,
}

// ---- Earnings figures ----
//
// Filled in by tally-core; every monetary field is exact cents under
// the hood and serializes as dollars.

/// Per-session earnings split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBreakdown {
    pub services: Money,
    pub add_ons: Money,
    pub tips: Money,
    pub total: Money,
}

/// Statistics over the multiset of per-session totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub count: u64,
    pub mean: Money,
    pub median: Money,
    pub min: Money,
    pub max: Money,
    pub std_dev: Money,
}

/// Tip statistics. Only sessions with tips > 0 enter the average and
/// median.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipStatistics {
    pub total_tips: Money,
    pub average_tip: Money,
    pub median_tip: Money,
    pub sessions_with_tips: u64,
    /// Tips as a percentage of non-tip earnings; 0 when that
    /// denominator is not positive
    pub tip_percentage: f64,
}

/// One day's gross total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: Money,
}

/// Productivity figures over the working days in the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Productivity {
    /// Distinct dates with at least one session
    pub work_days: u64,
    pub total_sessions: u64,
    pub sessions_per_day: f64,
    pub average_daily_earnings: Money,
}

/// Per-day activity metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub sessions: u64,
    pub services: Money,
    pub add_ons: Money,
    pub tips: Money,
}

impl DailyMetrics {
    pub fn total(&self) -> Money {
        self.services + self.add_ons + self.tips
    }
}

/// Inclusive span of dates present in the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The full earnings summary: everything the stats command, the desktop
/// mirror, and the report renderers consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub total_sessions: u64,
    pub total_earnings: Money,
    pub date_range: Option<DateRange>,
    pub sessions_by_location: BTreeMap<String, u64>,
    pub sessions_by_date: BTreeMap<NaiveDate, u64>,
    pub earnings_by_location: BTreeMap<String, Money>,
    pub daily: BTreeMap<NaiveDate, DailyMetrics>,
    pub statistics: SessionStatistics,
    pub tips: TipStatistics,
    pub best_days: Vec<DayTotal>,
    pub productivity: Productivity,
    pub service_breakdown: BTreeMap<String, u64>,
    pub addon_revenue: BTreeMap<String, Money>,
}
