//! Player repository.

use tracing::{debug, info};

use super::columns::{CREATED_AT, EOS_ID, ID, PLAYER_ID, PLAYER_NAME};
use super::{NewPlayer, PlayerRecord};
use crate::db::{Assignment, Connector, Dialect, Filter, Query, TableDefinition};
use crate::Result;

/// What [`PlayerRepository::record`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// A new row was inserted.
    Created,
    /// The existing row's name was refreshed.
    Updated,
}

/// Repository for the plugin's player table.
pub struct PlayerRepository<'a> {
    db: &'a dyn Connector,
    table: &'a str,
}

impl<'a> PlayerRepository<'a> {
    /// Create a repository over `table`.
    pub fn new(db: &'a dyn Connector, table: &'a str) -> Self {
        Self { db, table }
    }

    /// Player table layout for a backend.
    pub fn table_definition(dialect: Dialect) -> TableDefinition {
        match dialect {
            Dialect::MySql => TableDefinition::new()
                .column(ID, "INT NOT NULL AUTO_INCREMENT")
                .column(EOS_ID, "VARCHAR(50) NOT NULL")
                .column(PLAYER_ID, "VARCHAR(50) NOT NULL")
                .column(PLAYER_NAME, "VARCHAR(50) NOT NULL")
                .column(CREATED_AT, "DATETIME DEFAULT CURRENT_TIMESTAMP")
                .column("PRIMARY", "KEY(Id)")
                .column("UNIQUE", "INDEX EosId_UNIQUE (EosId ASC)"),
            Dialect::Sqlite => TableDefinition::new()
                .column(ID, "INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT")
                .column(EOS_ID, "TEXT NOT NULL UNIQUE")
                .column(PLAYER_ID, "TEXT")
                .column(PLAYER_NAME, "TEXT")
                .column(CREATED_AT, "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
        }
    }

    /// Create the table if it does not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        debug!(table = %self.table, "ensuring player table");
        let definition = Self::table_definition(self.db.dialect());
        self.db.create_table_if_not_exist(self.table, &definition).await
    }

    /// Insert a player.
    pub async fn add(&self, player: &NewPlayer) -> Result<()> {
        self.db
            .create(
                self.table,
                &[
                    (EOS_ID, player.eos_id.as_str().into()),
                    (PLAYER_ID, player.player_id.to_string().into()),
                    (PLAYER_NAME, player.player_name.as_str().into()),
                ],
            )
            .await
    }

    /// Get a player by unique id.
    pub async fn get(&self, eos_id: &str) -> Result<Option<PlayerRecord>> {
        let query = Query::select(self.table)
            .filter(Filter::eq(EOS_ID, eos_id))
            .limit(1);
        let rows = self.db.read(&query).await?;
        rows.first().map(PlayerRecord::from_row).transpose()
    }

    /// Whether a player row exists.
    pub async fn exists(&self, eos_id: &str) -> Result<bool> {
        Ok(self.get(eos_id).await?.is_some())
    }

    /// Set a player's name. Returns false if the player is unknown.
    pub async fn update_name(&self, eos_id: &str, name: &str) -> Result<bool> {
        let affected = self
            .db
            .update(
                self.table,
                &[Assignment::set(PLAYER_NAME, name)],
                &[Filter::eq(EOS_ID, eos_id)],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Delete a player. Returns false if the player is unknown.
    pub async fn delete(&self, eos_id: &str) -> Result<bool> {
        let affected = self
            .db
            .delete_row(self.table, &[Filter::eq(EOS_ID, eos_id)])
            .await?;
        Ok(affected > 0)
    }

    /// Insert the player, or refresh the name of an existing row.
    pub async fn record(&self, player: &NewPlayer) -> Result<Recorded> {
        if self.exists(&player.eos_id).await? {
            self.update_name(&player.eos_id, &player.player_name).await?;
            Ok(Recorded::Updated)
        } else {
            self.add(player).await?;
            info!(player = %player.eos_id, name = %player.player_name, "new player recorded");
            Ok(Recorded::Created)
        }
    }
}
