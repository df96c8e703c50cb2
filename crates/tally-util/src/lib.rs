//! Shared utilities for tallyd
//!
//! This crate provides:
//! - ID types (SessionId, DeviceId, ClientId)
//! - Fixed-point money arithmetic
//! - Business-date helpers (parse/format, report ranges)
//! - Error types
//! - Rate limiting helpers
//! - Default paths for socket, data, and log directories

mod error;
mod ids;
mod money;
mod paths;
mod rate_limit;
mod time;

pub use error::*;
pub use ids::*;
pub use money::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
