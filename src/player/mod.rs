//! Player module for the plugin.
//!
//! The plugin keeps one row per player it has served, in its own table.

mod repository;

pub use repository::{PlayerRepository, Recorded};

use crate::db::{Row, NULL_TEXT};
use crate::{PluginError, Result};

/// Column names of the player table.
pub mod columns {
    pub const ID: &str = "Id";
    pub const EOS_ID: &str = "EosId";
    pub const PLAYER_ID: &str = "PlayerId";
    pub const PLAYER_NAME: &str = "PlayerName";
    pub const CREATED_AT: &str = "CreateAt";
}

/// A stored player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Row id.
    pub id: i64,
    /// Platform unique id (the key every store uses).
    pub eos_id: String,
    /// In-game numeric player id, as text.
    pub player_id: String,
    /// Last seen character name.
    pub player_name: String,
    /// Creation time as stored by the backend.
    pub created_at: String,
}

impl PlayerRecord {
    /// Build a record from a result row.
    pub fn from_row(row: &Row) -> Result<Self> {
        let text = |column: &str| -> Result<String> {
            match row.get(column) {
                Some(value) if value == NULL_TEXT => Ok(String::new()),
                Some(value) => Ok(value.clone()),
                None => Err(PluginError::Database(format!(
                    "player row has no {column} column"
                ))),
            }
        };
        let id_text = text(columns::ID)?;
        let id = id_text
            .parse()
            .map_err(|_| PluginError::Database(format!("invalid player id {id_text:?}")))?;
        Ok(Self {
            id,
            eos_id: text(columns::EOS_ID)?,
            player_id: text(columns::PLAYER_ID)?,
            player_name: text(columns::PLAYER_NAME)?,
            created_at: text(columns::CREATED_AT)?,
        })
    }
}

/// An online player, as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlayer {
    /// Platform unique id.
    pub eos_id: String,
    /// In-game numeric player id.
    pub player_id: u64,
    /// Character name.
    pub player_name: String,
}

impl NewPlayer {
    /// Create a player.
    pub fn new(eos_id: impl Into<String>, player_id: u64, player_name: impl Into<String>) -> Self {
        Self {
            eos_id: eos_id.into(),
            player_id,
            player_name: player_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_row() {
        let record = PlayerRecord::from_row(&row(&[
            ("Id", "3"),
            ("EosId", "0002abc"),
            ("PlayerId", "123456"),
            ("PlayerName", "Rex"),
            ("CreateAt", "2026-01-02 03:04:05"),
        ]))
        .unwrap();
        assert_eq!(record.id, 3);
        assert_eq!(record.eos_id, "0002abc");
        assert_eq!(record.player_name, "Rex");
        assert_eq!(record.created_at, "2026-01-02 03:04:05");
    }

    #[test]
    fn test_from_row_null_name() {
        let record = PlayerRecord::from_row(&row(&[
            ("Id", "1"),
            ("EosId", "x"),
            ("PlayerId", "NULL"),
            ("PlayerName", "NULL"),
            ("CreateAt", "NULL"),
        ]))
        .unwrap();
        assert_eq!(record.player_name, "");
    }

    #[test]
    fn test_from_row_missing_column() {
        let result = PlayerRecord::from_row(&row(&[("Id", "1")]));
        assert!(matches!(result, Err(PluginError::Database(_))));
    }
}
