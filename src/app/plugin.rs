//! Blocking facade for the host.
//!
//! The host calls into the plugin from its own threads and expects each
//! call to finish before returning, so every method blocks on a private
//! single-threaded runtime.

use std::future::Future;

use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};

use super::{AppContext, CommandError};
use crate::config::{CommandSettings, Config, PluginPaths};
use crate::player::NewPlayer;
use crate::{logging, PluginError, Result};

/// A loaded plugin.
pub struct Plugin {
    paths: PluginPaths,
    runtime: Runtime,
    context: Option<AppContext>,
}

impl Plugin {
    /// Load `config.json` from the plugin directory, start logging and open
    /// every store.
    pub fn start(paths: PluginPaths) -> Result<Self> {
        let config = match Config::load(paths.config_path()) {
            Ok(config) => config,
            Err(e) => {
                logging::init_console_only("info");
                error!(error = %e, "failed to load {}", paths.config_path().display());
                return Err(e);
            }
        };
        if let Err(e) = logging::init(&config.logging, &paths.default_log_path()) {
            logging::init_console_only(&config.logging.level);
            error!(error = %e, "file logging unavailable, using console only");
        }
        Self::start_with_config(paths, config)
    }

    /// Start with an already loaded configuration. Logging is left to the
    /// caller.
    pub fn start_with_config(paths: PluginPaths, config: Config) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let context = runtime.block_on(AppContext::open(config, &paths))?;
        info!(plugin = %paths.name, "plugin loaded");
        Ok(Self {
            paths,
            runtime,
            context: Some(context),
        })
    }

    fn context(&self) -> Result<&AppContext> {
        self.context
            .as_ref()
            .ok_or_else(|| PluginError::NotFound("plugin context".to_string()))
    }

    /// Run any future against the context on the plugin runtime.
    pub fn block_on<'a, F, Fut>(&'a self, f: F) -> Result<Fut::Output>
    where
        F: FnOnce(&'a AppContext) -> Fut,
        Fut: Future + 'a,
    {
        let context = self.context()?;
        Ok(self.runtime.block_on(f(context)))
    }

    /// The player's effective permission group.
    pub fn resolve_group(&self, player_id: &str) -> Result<String> {
        self.block_on(|ctx| ctx.resolver().resolve_player_group(player_id))
    }

    /// Settings of an enabled command for a player.
    pub fn command_settings(&self, player_id: &str, command: &str) -> Result<Option<CommandSettings>> {
        self.block_on(|ctx| ctx.resolver().command_for_player(player_id, command))
    }

    /// Whether the player can pay `cost`.
    pub fn check_points(&self, player_id: &str, cost: i64) -> bool {
        matches!(self.block_on(|ctx| ctx.ledger().check(player_id, cost)), Ok(Ok(())))
    }

    /// Spend `cost` from the player's balance.
    pub fn spend_points(&self, player_id: &str, cost: i64) -> bool {
        matches!(self.block_on(|ctx| ctx.ledger().spend(player_id, cost)), Ok(Ok(())))
    }

    /// Run a gated command with a synchronous body.
    pub fn run_command<T, F>(
        &self,
        player: &NewPlayer,
        command: &str,
        action: F,
    ) -> std::result::Result<T, CommandError>
    where
        F: FnOnce(CommandSettings) -> Result<T>,
    {
        let context = self.context().map_err(CommandError::Action)?;
        self.runtime.block_on(
            context.run_command(player, command, |settings| async move { action(settings) }),
        )
    }

    /// Gated deletion of the player's record.
    pub fn delete_player(&self, player: &NewPlayer) -> std::result::Result<bool, CommandError> {
        let context = self.context().map_err(CommandError::Action)?;
        self.runtime.block_on(context.delete_player_command(player))
    }

    /// Text to send the player for a failed command.
    pub fn player_message(&self, err: &CommandError, settings: Option<&CommandSettings>) -> String {
        match self.context() {
            Ok(context) => context.player_message(err, settings),
            Err(_) => err.to_string(),
        }
    }

    /// Re-read `config.json` and apply it.
    pub fn reload(&mut self) -> Result<()> {
        let config = Config::load(self.paths.config_path()).map_err(|e| {
            error!(error = %e, "reload failed");
            e
        })?;
        self.context
            .as_mut()
            .ok_or_else(|| PluginError::NotFound("plugin context".to_string()))?
            .reload(config)
    }

    /// Close every store.
    pub fn shutdown(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if let Some(context) = self.context.take() {
            self.runtime.block_on(context.close());
            info!(plugin = %self.paths.name, "plugin unloaded");
        }
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        self.close();
    }
}
