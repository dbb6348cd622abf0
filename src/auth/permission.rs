//! Permission group resolution.
//!
//! A player's group memberships live in an external permissions table as a
//! comma-separated list. The configured groups decide which of them counts
//! (lowest priority value wins) and which commands that group may run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{CommandSettings, PermissionGroups, PermissionsDbSettings, DEFAULT_GROUP};
use crate::db::{Connector, Filter, Query, NULL_TEXT};

/// Split a stored group list into group names.
///
/// Entries are trimmed and empty entries dropped. An empty result means the
/// player belongs to the fallback group only.
///
/// # Examples
///
/// ```
/// use ark_plugin_template::auth::parse_group_list;
///
/// assert_eq!(parse_group_list("Admins,,VIP, "), vec!["Admins", "VIP"]);
/// assert_eq!(parse_group_list(""), vec!["Default"]);
/// ```
pub fn parse_group_list(text: &str) -> Vec<String> {
    if text == NULL_TEXT {
        return vec![DEFAULT_GROUP.to_string()];
    }
    let groups: Vec<String> = text
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();
    if groups.is_empty() {
        vec![DEFAULT_GROUP.to_string()]
    } else {
        groups
    }
}

/// Pick the effective group among `assigned`.
///
/// Only groups present in `groups` are considered. The lowest priority
/// value wins; on a tie the group listed first wins. Falls back to
/// `"Default"` when none of the assigned groups is configured.
pub fn select_group(assigned: &[String], groups: &PermissionGroups) -> String {
    let mut best: Option<(&str, i64)> = None;
    for name in assigned {
        let Some(group) = groups.get(name) else {
            continue;
        };
        match best {
            Some((_, priority)) if priority <= group.priority => {}
            _ => best = Some((name.as_str(), group.priority)),
        }
    }
    best.map_or_else(|| DEFAULT_GROUP.to_string(), |(name, _)| name.to_string())
}

/// Look up a command's settings in a group.
///
/// Returns `None` when either name is empty or either level is missing.
pub fn lookup_command_config<'a>(
    groups: &'a PermissionGroups,
    group: &str,
    command: &str,
) -> Option<&'a CommandSettings> {
    if group.is_empty() || command.is_empty() {
        return None;
    }
    groups.get(group)?.commands.get(command)
}

/// Resolves players to permission groups and commands.
pub struct PermissionResolver {
    store: Option<Arc<dyn Connector>>,
    settings: PermissionsDbSettings,
    groups: PermissionGroups,
    debug: bool,
}

impl PermissionResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    ///
    /// * `store` - Connector to the permissions database, `None` when the
    ///   store is disabled
    /// * `settings` - Table and column names of the permissions table
    /// * `groups` - Configured permission groups
    /// * `debug` - Log every resolution at info level
    pub fn new(
        store: Option<Arc<dyn Connector>>,
        settings: &PermissionsDbSettings,
        groups: &PermissionGroups,
        debug: bool,
    ) -> Self {
        Self {
            store,
            settings: settings.clone(),
            groups: groups.clone(),
            debug,
        }
    }

    /// Configured groups.
    pub fn groups(&self) -> &PermissionGroups {
        &self.groups
    }

    /// Replace the configured groups (config reload).
    pub fn set_groups(&mut self, groups: &PermissionGroups, debug: bool) {
        self.groups = groups.clone();
        self.debug = debug;
    }

    /// Groups stored for a player; `["Default"]` when nothing usable is
    /// stored or the store cannot be read.
    pub async fn player_groups(&self, player_id: &str) -> Vec<String> {
        let fallback = || vec![DEFAULT_GROUP.to_string()];
        let Some(store) = self.store.as_ref().filter(|_| self.settings.enabled) else {
            debug!("permissions store disabled, using default group");
            return fallback();
        };

        let query = Query::select(&self.settings.table_name)
            .filter(Filter::eq(&self.settings.unique_id_field, player_id))
            .limit(1);
        let rows = match store.read(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(player = %player_id, error = %e, "cannot read permission groups");
                return fallback();
            }
        };
        match rows
            .first()
            .and_then(|row| row.get(&self.settings.permission_group_field))
        {
            Some(text) => parse_group_list(text),
            None => fallback(),
        }
    }

    /// The player's effective group.
    pub async fn resolve_player_group(&self, player_id: &str) -> String {
        let assigned = self.player_groups(player_id).await;
        let group = select_group(&assigned, &self.groups);
        if self.debug {
            info!(player = %player_id, groups = ?assigned, group = %group, "resolved permission group");
        }
        group
    }

    /// Settings of `command` in `group`, if configured.
    pub fn lookup_command_config(&self, group: &str, command: &str) -> Option<&CommandSettings> {
        lookup_command_config(&self.groups, group, command)
    }

    /// Settings of `command` for a player, only when the player's group
    /// has it enabled.
    pub async fn command_for_player(
        &self,
        player_id: &str,
        command: &str,
    ) -> Option<CommandSettings> {
        let group = self.resolve_player_group(player_id).await;
        let settings = self
            .lookup_command_config(&group, command)
            .filter(|settings| settings.enabled)
            .cloned();
        if self.debug {
            info!(
                player = %player_id,
                group = %group,
                command = %command,
                allowed = settings.is_some(),
                "command permission"
            );
        }
        settings
    }
}
