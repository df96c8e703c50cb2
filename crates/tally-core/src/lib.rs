//! Earnings computation core for tally
//!
//! Pure, side-effect-free aggregation over session records. Every
//! surface that shows an earnings figure - the service's stats command,
//! the desktop mirror, the CLI reports - computes it here and nowhere
//! else.
//!
//! The contract is deliberately permissive: no operation in this crate
//! returns an error or panics on stored data, however incomplete. A
//! line item missing a numeric field contributes zero. Negative amounts
//! are not validated against; they propagate arithmetically.

mod calculator;

pub use calculator::*;
