use std::process::ExitCode;

use tracing::{error, info};

use ark_plugin_template::config::DEFAULT_PLUGIN_NAME;
use ark_plugin_template::{Plugin, PluginPaths};

const USAGE: &str = "usage: ark-plugin-template <server-dir> <player-id> [command [plugin-name]]";

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let (Some(server_dir), Some(player_id)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let command = args.next();
    let name = args.next().unwrap_or_else(|| DEFAULT_PLUGIN_NAME.to_string());

    let plugin = match Plugin::start(PluginPaths::new(server_dir, name)) {
        Ok(plugin) => plugin,
        Err(e) => {
            eprintln!("Failed to start plugin: {e}");
            return ExitCode::FAILURE;
        }
    };

    match plugin.resolve_group(&player_id) {
        Ok(group) => info!(player = %player_id, group = %group, "permission group"),
        Err(e) => error!(error = %e, "cannot resolve group"),
    }

    if let Some(command) = command {
        match plugin.command_settings(&player_id, &command) {
            Ok(Some(settings)) => {
                let affordable = plugin.check_points(&player_id, settings.cost);
                info!(command = %command, cost = settings.cost, affordable, "command allowed");
            }
            Ok(None) => info!(command = %command, "command not allowed"),
            Err(e) => error!(error = %e, "cannot look up command"),
        }
    }

    plugin.shutdown();
    ExitCode::SUCCESS
}
