//! Application context: the opened stores and the services built on them.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::auth::PermissionResolver;
use crate::config::{CommandSettings, Config, PluginPaths};
use crate::db::{create_connector, Connector};
use crate::player::{NewPlayer, PlayerRepository, Recorded};
use crate::points::{PointsError, PointsLedger};
use crate::{PluginError, Result};

/// Permission group key of the repair command.
pub const REPAIR_ITEM_CMD: &str = "RepairItemCMD";

/// Permission group key of the delete-player command.
pub const DELETE_PLAYER_CMD: &str = "DeletePlayerCMD";

/// Why a gated command did not run.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The player's group does not have the command enabled.
    #[error("{command} is not enabled for group {group}")]
    PermissionDenied { group: String, command: String },

    /// The cost could not be paid.
    #[error(transparent)]
    Points(#[from] PointsError),

    /// The command body itself failed.
    #[error("command failed: {0}")]
    Action(PluginError),
}

/// Opened stores plus the services built on them.
///
/// Owns every connector; dropping or closing the context releases them.
pub struct AppContext {
    config: Config,
    plugin_db: Arc<dyn Connector>,
    permissions_db: Option<Arc<dyn Connector>>,
    points_db: Option<Arc<dyn Connector>>,
    resolver: PermissionResolver,
    ledger: PointsLedger,
}

impl AppContext {
    /// Open every configured store.
    ///
    /// Order: plugin store (and its player table), permissions store (when
    /// enabled), points store (when enabled), then the resolver and ledger.
    pub async fn open(config: Config, paths: &PluginPaths) -> Result<Self> {
        config.validate()?;
        let plugin_db = create_connector(&config.plugin_db.connection, paths).await?;
        let permissions_db = if config.permissions_db.enabled {
            Some(create_connector(&config.permissions_db.connection, paths).await?)
        } else {
            None
        };
        let points_db = if config.points_db.enabled {
            Some(create_connector(&config.points_db.connection, paths).await?)
        } else {
            None
        };
        Self::from_parts(config, plugin_db, permissions_db, points_db).await
    }

    /// Build a context over already opened connectors.
    pub async fn from_parts(
        config: Config,
        plugin_db: Arc<dyn Connector>,
        permissions_db: Option<Arc<dyn Connector>>,
        points_db: Option<Arc<dyn Connector>>,
    ) -> Result<Self> {
        config.validate()?;

        let players = PlayerRepository::new(plugin_db.as_ref(), &config.plugin_db.table_name);
        if let Err(e) = players.ensure_table().await {
            error!(error = %e, "cannot create the player table");
        }

        let resolver = PermissionResolver::new(
            permissions_db.clone(),
            &config.permissions_db,
            &config.permission_groups,
            config.debug.permissions,
        );
        let ledger = PointsLedger::new(points_db.clone(), &config.points_db, config.debug.points);
        info!(
            plugin_db = plugin_db.backend_name(),
            permissions = permissions_db.is_some(),
            points = points_db.is_some(),
            "stores opened"
        );

        Ok(Self {
            config,
            plugin_db,
            permissions_db,
            points_db,
            resolver,
            ledger,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The plugin's own store.
    pub fn plugin_db(&self) -> &dyn Connector {
        self.plugin_db.as_ref()
    }

    /// Repository over the plugin's player table.
    pub fn players(&self) -> PlayerRepository<'_> {
        PlayerRepository::new(self.plugin_db.as_ref(), &self.config.plugin_db.table_name)
    }

    /// Permission resolver.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Points ledger.
    pub fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// Message shown to the player for a failed command.
    ///
    /// A per-command override (same key as the global message) wins over the
    /// global `Messages` entry.
    pub fn player_message(&self, err: &CommandError, settings: Option<&CommandSettings>) -> String {
        let (key, global) = match err {
            CommandError::PermissionDenied { .. } => {
                ("PermErrorMSG", &self.config.messages.perm_error)
            }
            CommandError::Points(_) => ("PointsErrorMSG", &self.config.messages.points_error),
            CommandError::Action(e) => return e.to_string(),
        };
        settings
            .and_then(|s| s.message(key))
            .map_or_else(|| global.clone(), str::to_string)
    }

    /// Record a player in the plugin's table.
    pub async fn record_player(&self, player: &NewPlayer) -> Result<Recorded> {
        self.players().record(player).await
    }

    /// Run `action` behind the permission and points gate.
    ///
    /// The command must be enabled for the player's group and its cost must
    /// be affordable before the action runs. After the action succeeded the
    /// player is recorded and the cost is spent.
    pub async fn run_command<T, F, Fut>(
        &self,
        player: &NewPlayer,
        command: &str,
        action: F,
    ) -> std::result::Result<T, CommandError>
    where
        F: FnOnce(CommandSettings) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.gated(player, command, true, action).await
    }

    /// Delete the player's own record, behind the `DeletePlayerCMD` gate.
    ///
    /// Returns whether a row was deleted.
    pub async fn delete_player_command(
        &self,
        player: &NewPlayer,
    ) -> std::result::Result<bool, CommandError> {
        self.gated(player, DELETE_PLAYER_CMD, false, move |_| async move {
            self.players().delete(&player.eos_id).await
        })
        .await
    }

    async fn gated<T, F, Fut>(
        &self,
        player: &NewPlayer,
        command: &str,
        record: bool,
        action: F,
    ) -> std::result::Result<T, CommandError>
    where
        F: FnOnce(CommandSettings) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let group = self.resolver.resolve_player_group(&player.eos_id).await;
        let settings = match self.resolver.lookup_command_config(&group, command) {
            Some(settings) if settings.enabled => settings.clone(),
            _ => {
                info!(player = %player.eos_id, group = %group, command = %command, "command denied");
                return Err(CommandError::PermissionDenied {
                    group,
                    command: command.to_string(),
                });
            }
        };
        let cost = settings.cost;

        self.ledger.check(&player.eos_id, cost).await?;
        let output = action(settings).await.map_err(CommandError::Action)?;

        if record {
            if let Err(e) = self.record_player(player).await {
                error!(player = %player.eos_id, error = %e, "cannot record player");
            }
        }
        // The action already ran; a lost race on the balance is logged only.
        if let Err(e) = self.ledger.spend(&player.eos_id, cost).await {
            warn!(player = %player.eos_id, command = %command, error = %e, "cost not collected");
        }
        if self.config.debug.plugin {
            info!(player = %player.eos_id, command = %command, cost, "command executed");
        }
        Ok(output)
    }

    /// Apply a reloaded configuration.
    ///
    /// Groups, messages and debug flags take effect immediately. Store
    /// settings need a restart; changes to them are reported.
    pub fn reload(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        if config.plugin_db != self.config.plugin_db
            || config.permissions_db != self.config.permissions_db
            || config.points_db != self.config.points_db
        {
            warn!("database settings changed; restart the plugin to apply them");
        }

        let mut config = config;
        config.plugin_db = self.config.plugin_db.clone();
        config.permissions_db = self.config.permissions_db.clone();
        config.points_db = self.config.points_db.clone();

        self.resolver
            .set_groups(&config.permission_groups, config.debug.permissions);
        self.ledger.set_debug(config.debug.points);
        self.config = config;
        info!("configuration reloaded");
        Ok(())
    }

    /// Close every store, points first, plugin store last.
    pub async fn close(self) {
        if let Some(points) = &self.points_db {
            points.close().await;
        }
        if let Some(permissions) = &self.permissions_db {
            permissions.close().await;
        }
        self.plugin_db.close().await;
        info!("stores closed");
    }
}
