//! Application module.
//!
//! Ties the stores, the permission resolver and the points ledger together
//! and exposes the gated command flow to the host.

mod context;
mod plugin;

pub use context::{AppContext, CommandError, DELETE_PLAYER_CMD, REPAIR_ITEM_CMD};
pub use plugin::Plugin;
