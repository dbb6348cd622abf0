//! Authorization module for the plugin.
//!
//! Players are mapped to permission groups stored in an external table;
//! groups decide which commands a player may run and at what cost.

pub mod permission;

pub use permission::{lookup_command_config, parse_group_list, select_group, PermissionResolver};
