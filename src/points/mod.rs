//! Points module for the plugin.
//!
//! Command costs are paid from a balance kept by an external shop plugin.
//! The table is never created here; only existing accounts are read and
//! charged.

mod ledger;

pub use ledger::{PointsError, PointsLedger};
