//! ARK: Survival Evolved plugin core.
//!
//! Storage connectors for MySQL and SQLite, permission group resolution and
//! a points ledger, wired together behind a gated command flow.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod player;
pub mod points;

pub use app::{AppContext, CommandError, Plugin, DELETE_PLAYER_CMD, REPAIR_ITEM_CMD};
pub use auth::PermissionResolver;
pub use config::{Config, PluginPaths};
pub use db::{
    create_connector, Assignment, Connector, Dialect, Filter, Query, Row, SqlValue, Statement,
    TableDefinition,
};
pub use error::{PluginError, Result};
pub use player::{NewPlayer, PlayerRecord, PlayerRepository};
pub use points::{PointsError, PointsLedger};
