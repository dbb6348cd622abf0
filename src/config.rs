//! Configuration module for the plugin.
//!
//! The host convention is a `config.json` with PascalCase keys in the
//! plugin's directory. A `.toml` file with the same keys is accepted too.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::db::validate_identifier;
use crate::{PluginError, Result};

/// Plugin name used for the plugin directory and default file names.
pub const DEFAULT_PLUGIN_NAME: &str = "PluginTemplate";

/// Name of the implicit fallback permission group.
pub const DEFAULT_GROUP: &str = "Default";

/// Filesystem locations derived from the host's install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginPaths {
    /// Server install directory (the host's current directory).
    pub server_dir: PathBuf,
    /// Plugin name.
    pub name: String,
}

impl PluginPaths {
    /// Create paths for a plugin installed under `server_dir`.
    pub fn new(server_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            server_dir: server_dir.into(),
            name: name.into(),
        }
    }

    /// `<server>/ArkApi/Plugins/<name>`.
    pub fn plugin_dir(&self) -> PathBuf {
        self.server_dir
            .join("ArkApi")
            .join("Plugins")
            .join(&self.name)
    }

    /// `<plugin dir>/config.json`.
    pub fn config_path(&self) -> PathBuf {
        self.plugin_dir().join("config.json")
    }

    /// `<plugin dir>/<name>.db`, used when SQLite has no explicit path.
    pub fn default_database_path(&self) -> PathBuf {
        self.plugin_dir().join(format!("{}.db", self.name))
    }

    /// `<plugin dir>/logs/<name>.log`.
    pub fn default_log_path(&self) -> PathBuf {
        self.plugin_dir()
            .join("logs")
            .join(format!("{}.log", self.name))
    }
}

/// Connection parameters shared by every store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionSettings {
    /// Use the MySQL server backend (true) or an SQLite file (false).
    #[serde(rename = "UseMySQL", alias = "UseServer", default = "default_use_mysql")]
    pub use_mysql: bool,
    /// MySQL host.
    #[serde(rename = "Host", default = "default_mysql_host")]
    pub host: String,
    /// MySQL user.
    #[serde(rename = "User", default)]
    pub user: String,
    /// MySQL password.
    #[serde(rename = "Password", default)]
    pub password: String,
    /// MySQL database name.
    #[serde(rename = "Database", default)]
    pub database: String,
    /// MySQL port.
    #[serde(rename = "Port", default = "default_mysql_port")]
    pub port: u16,
    /// SSL mode 0..=4 (disabled .. verify identity); anything else is unset.
    #[serde(rename = "MysqlSSLMode", default = "default_ssl_mode")]
    pub ssl_mode: i32,
    /// Minimum TLS protocol version, e.g. "TLSv1.2". Empty means unset.
    #[serde(rename = "MysqlTLSVersion", default)]
    pub tls_version: String,
    /// SQLite database file. Empty means the plugin's default path.
    #[serde(rename = "SQLiteDatabasePath", default)]
    pub sqlite_path: String,
}

fn default_use_mysql() -> bool {
    true
}

fn default_mysql_host() -> String {
    "localhost".to_string()
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_ssl_mode() -> i32 {
    -1
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            use_mysql: default_use_mysql(),
            host: default_mysql_host(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
            port: default_mysql_port(),
            ssl_mode: default_ssl_mode(),
            tls_version: String::new(),
            sqlite_path: String::new(),
        }
    }
}

impl ConnectionSettings {
    /// SQLite settings with an explicit file path.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            use_mysql: false,
            sqlite_path: path.into(),
            ..Self::default()
        }
    }
}

/// The plugin's own store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginDbSettings {
    /// Connection parameters.
    #[serde(flatten)]
    pub connection: ConnectionSettings,
    /// Player table name. Required.
    #[serde(rename = "TableName")]
    pub table_name: String,
}

impl Default for PluginDbSettings {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            table_name: "Players".to_string(),
        }
    }
}

/// The external permissions store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionsDbSettings {
    /// Whether the store is opened at all.
    #[serde(rename = "Enabled", default = "default_permissions_enabled")]
    pub enabled: bool,
    /// Connection parameters.
    #[serde(flatten)]
    pub connection: ConnectionSettings,
    /// Table holding player group assignments.
    #[serde(rename = "TableName", default = "default_permissions_table")]
    pub table_name: String,
    /// Column holding the player's unique id.
    #[serde(rename = "UniqueIDField", default = "default_permissions_unique_id")]
    pub unique_id_field: String,
    /// Column holding the comma-separated group list.
    #[serde(rename = "PermissionGroupField", default = "default_permission_group_field")]
    pub permission_group_field: String,
}

fn default_permissions_enabled() -> bool {
    true
}

fn default_permissions_table() -> String {
    "Players".to_string()
}

fn default_permissions_unique_id() -> String {
    "EOS_Id".to_string()
}

fn default_permission_group_field() -> String {
    "PermissionGroups".to_string()
}

impl Default for PermissionsDbSettings {
    fn default() -> Self {
        Self {
            enabled: default_permissions_enabled(),
            connection: ConnectionSettings::default(),
            table_name: default_permissions_table(),
            unique_id_field: default_permissions_unique_id(),
            permission_group_field: default_permission_group_field(),
        }
    }
}

/// The external points (shop) store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PointsDbSettings {
    /// Whether points are checked at all. Disabled means every cost passes.
    #[serde(rename = "Enabled", default)]
    pub enabled: bool,
    /// Connection parameters.
    #[serde(flatten)]
    pub connection: ConnectionSettings,
    /// Table holding player accounts.
    #[serde(rename = "TableName", default = "default_points_table")]
    pub table_name: String,
    /// Column holding the player's unique id.
    #[serde(rename = "UniqueIDField", default = "default_points_unique_id")]
    pub unique_id_field: String,
    /// Column holding the current balance.
    #[serde(rename = "PointsField", default = "default_points_field")]
    pub points_field: String,
    /// Column holding the lifetime amount spent. Empty disables it.
    #[serde(rename = "TotalSpentField", default = "default_total_spent_field")]
    pub total_spent_field: String,
}

fn default_points_table() -> String {
    "ArkShopPlayers".to_string()
}

fn default_points_unique_id() -> String {
    "EosId".to_string()
}

fn default_points_field() -> String {
    "Points".to_string()
}

fn default_total_spent_field() -> String {
    "TotalSpent".to_string()
}

impl Default for PointsDbSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            connection: ConnectionSettings::default(),
            table_name: default_points_table(),
            unique_id_field: default_points_unique_id(),
            points_field: default_points_field(),
            total_spent_field: default_total_spent_field(),
        }
    }
}

impl PointsDbSettings {
    /// The total-spent column, if one is configured.
    pub fn total_spent_column(&self) -> Option<&str> {
        if self.total_spent_field.is_empty() {
            None
        } else {
            Some(&self.total_spent_field)
        }
    }
}

/// Per-command settings inside a permission group.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommandSettings {
    /// Whether the group may use the command.
    #[serde(rename = "Enabled", default)]
    pub enabled: bool,
    /// Point cost. 0 is free, -1 is invalid.
    #[serde(rename = "Cost", default)]
    pub cost: i64,
    /// Message overrides and any other per-command keys.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CommandSettings {
    /// Settings for an enabled command with the given cost.
    pub fn enabled_with_cost(cost: i64) -> Self {
        Self {
            enabled: true,
            cost,
            extra: BTreeMap::new(),
        }
    }

    /// A string-valued override such as a custom message.
    pub fn message(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// A named, prioritized bundle of command settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PermissionGroup {
    /// Lower numbers take precedence.
    #[serde(rename = "Priority", default = "default_priority")]
    pub priority: i64,
    /// Command name to settings.
    #[serde(rename = "Commands", default)]
    pub commands: BTreeMap<String, CommandSettings>,
}

fn default_priority() -> i64 {
    i64::MAX
}

impl PermissionGroup {
    /// A group with the given priority and no commands.
    pub fn with_priority(priority: i64) -> Self {
        Self {
            priority,
            commands: BTreeMap::new(),
        }
    }

    /// Add a command to the group.
    pub fn command(mut self, name: impl Into<String>, settings: CommandSettings) -> Self {
        self.commands.insert(name.into(), settings);
        self
    }
}

/// Group name to group.
pub type PermissionGroups = BTreeMap<String, PermissionGroup>;

/// Player-facing messages.
#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
    /// Shown when a command is denied.
    #[serde(rename = "PermErrorMSG", default = "default_perm_error_msg")]
    pub perm_error: String,
    /// Shown when the player cannot afford a command.
    #[serde(rename = "PointsErrorMSG", default = "default_points_error_msg")]
    pub points_error: String,
    /// Any other message keys.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

fn default_perm_error_msg() -> String {
    "You don't have permission to use this command.".to_string()
}

fn default_points_error_msg() -> String {
    "Not enough points.".to_string()
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            perm_error: default_perm_error_msg(),
            points_error: default_points_error_msg(),
            other: BTreeMap::new(),
        }
    }
}

/// Verbose logging switches per subsystem.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DebugFlags {
    /// General plugin diagnostics.
    #[serde(rename = "PluginTemplate", default)]
    pub plugin: bool,
    /// Points ledger diagnostics.
    #[serde(rename = "Points", default)]
    pub points: bool,
    /// Permission resolver diagnostics.
    #[serde(rename = "Permissions", default)]
    pub permissions: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(rename = "Level", default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty means `<plugin dir>/logs/<name>.log`.
    #[serde(rename = "File", default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// The plugin's own store. Required.
    #[serde(rename = "PluginDBSettings")]
    pub plugin_db: PluginDbSettings,
    /// Permissions store.
    #[serde(rename = "PermissionsDBSettings", default)]
    pub permissions_db: PermissionsDbSettings,
    /// Points store.
    #[serde(rename = "PointsDBSettings", default)]
    pub points_db: PointsDbSettings,
    /// Permission groups.
    #[serde(rename = "PermissionGroups", default)]
    pub permission_groups: PermissionGroups,
    /// Command id to chat command text, e.g. `RepairItemCMD` -> `/repair`.
    #[serde(rename = "Commands", default)]
    pub commands: BTreeMap<String, String>,
    /// Player-facing messages.
    #[serde(rename = "Messages", default)]
    pub messages: Messages,
    /// Debug switches.
    #[serde(rename = "Debug", default)]
    pub debug: DebugFlags,
    /// Logging configuration.
    #[serde(rename = "Logging", default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    /// The result is validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PluginError::Config(format!("cannot open {}: {e}", path.display()))
        })?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::parse_toml(&content)?,
            _ => Self::parse_json(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse configuration from a TOML string.
    pub fn parse_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Validate the configuration.
    ///
    /// Every table and column name that ends up in generated SQL must be a
    /// plain identifier, and the plugin table must be named.
    pub fn validate(&self) -> Result<()> {
        let mut names: Vec<(&str, &str)> =
            vec![("PluginDBSettings.TableName", &self.plugin_db.table_name)];
        if self.permissions_db.enabled {
            names.push(("PermissionsDBSettings.TableName", &self.permissions_db.table_name));
            names.push((
                "PermissionsDBSettings.UniqueIDField",
                &self.permissions_db.unique_id_field,
            ));
            names.push((
                "PermissionsDBSettings.PermissionGroupField",
                &self.permissions_db.permission_group_field,
            ));
        }
        if self.points_db.enabled {
            names.push(("PointsDBSettings.TableName", &self.points_db.table_name));
            names.push(("PointsDBSettings.UniqueIDField", &self.points_db.unique_id_field));
            names.push(("PointsDBSettings.PointsField", &self.points_db.points_field));
            if let Some(total) = self.points_db.total_spent_column() {
                names.push(("PointsDBSettings.TotalSpentField", total));
            }
        }

        for (key, name) in names {
            validate_identifier(name)
                .map_err(|_| PluginError::Config(format!("{key} is not a valid name: {name:?}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{ "PluginDBSettings": { "TableName": "Players" } }"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::parse_json(MINIMAL).unwrap();

        assert_eq!(config.plugin_db.table_name, "Players");
        assert!(config.plugin_db.connection.use_mysql);
        assert_eq!(config.plugin_db.connection.port, 3306);
        assert_eq!(config.plugin_db.connection.ssl_mode, -1);
        assert!(config.plugin_db.connection.tls_version.is_empty());

        assert!(config.permissions_db.enabled);
        assert_eq!(config.permissions_db.table_name, "Players");
        assert_eq!(config.permissions_db.unique_id_field, "EOS_Id");
        assert_eq!(config.permissions_db.permission_group_field, "PermissionGroups");

        assert!(!config.points_db.enabled);
        assert_eq!(config.points_db.table_name, "ArkShopPlayers");
        assert_eq!(config.points_db.unique_id_field, "EosId");
        assert_eq!(config.points_db.points_field, "Points");
        assert_eq!(config.points_db.total_spent_column(), Some("TotalSpent"));

        assert!(config.permission_groups.is_empty());
        assert_eq!(config.messages.points_error, "Not enough points.");
        assert!(!config.debug.points);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_plugin_table_is_an_error() {
        let result = Config::parse_json(r#"{ "PluginDBSettings": { "UseMySQL": false } }"#);
        assert!(matches!(result, Err(PluginError::Config(_))));

        let result = Config::parse_json("{}");
        assert!(matches!(result, Err(PluginError::Config(_))));
    }

    #[test]
    fn test_full_json_config() {
        let json = r#"{
            "PluginDBSettings": {
                "UseMySQL": true, "Host": "db.local", "User": "ark", "Password": "pw",
                "Database": "ark", "Port": 3307, "MysqlSSLMode": 2,
                "MysqlTLSVersion": "TLSv1.2", "TableName": "PluginPlayers"
            },
            "PermissionsDBSettings": {
                "Enabled": true, "UseServer": false, "SQLiteDatabasePath": "perms.db"
            },
            "PointsDBSettings": {
                "Enabled": true, "UseMySQL": false, "TotalSpentField": ""
            },
            "PermissionGroups": {
                "Default": { "Priority": 999, "Commands": {
                    "RepairItemCMD": { "Enabled": true, "Cost": 5, "RepairItemsMSG": "Fixed {}" }
                } },
                "VIP": { "Priority": 1 }
            },
            "Commands": { "RepairItemCMD": "/repair" },
            "Messages": { "PermErrorMSG": "Nope", "RepairItemsMSG": "All items repaired" },
            "Debug": { "PluginTemplate": true, "Points": true, "Permissions": false }
        }"#;

        let config = Config::parse_json(json).unwrap();

        let conn = &config.plugin_db.connection;
        assert_eq!(conn.host, "db.local");
        assert_eq!(conn.port, 3307);
        assert_eq!(conn.ssl_mode, 2);
        assert_eq!(conn.tls_version, "TLSv1.2");
        assert_eq!(config.plugin_db.table_name, "PluginPlayers");

        assert!(!config.permissions_db.connection.use_mysql);
        assert_eq!(config.permissions_db.connection.sqlite_path, "perms.db");

        assert!(config.points_db.enabled);
        assert_eq!(config.points_db.total_spent_column(), None);

        let default = &config.permission_groups["Default"];
        assert_eq!(default.priority, 999);
        let repair = &default.commands["RepairItemCMD"];
        assert!(repair.enabled);
        assert_eq!(repair.cost, 5);
        assert_eq!(repair.message("RepairItemsMSG"), Some("Fixed {}"));
        assert!(config.permission_groups["VIP"].commands.is_empty());

        assert_eq!(config.commands["RepairItemCMD"], "/repair");
        assert_eq!(config.messages.perm_error, "Nope");
        assert_eq!(config.messages.points_error, "Not enough points.");
        assert!(config.debug.plugin);
        assert!(config.debug.points);
        assert!(!config.debug.permissions);
    }

    #[test]
    fn test_toml_config() {
        let toml = r#"
[PluginDBSettings]
UseMySQL = false
TableName = "Players"

[PermissionGroups.Admin]
Priority = 0

[PermissionGroups.Admin.Commands.DeletePlayerCMD]
Enabled = true
Cost = 10
"#;
        let config = Config::parse_toml(toml).unwrap();
        assert!(!config.plugin_db.connection.use_mysql);
        let admin = &config.permission_groups["Admin"];
        assert_eq!(admin.priority, 0);
        assert_eq!(admin.commands["DeletePlayerCMD"].cost, 10);
    }

    #[test]
    fn test_validate_rejects_bad_field_names() {
        let mut config = Config::parse_json(MINIMAL).unwrap();
        config.points_db.enabled = true;
        config.points_db.points_field = "Points; DROP TABLE x".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PointsDBSettings.PointsField"));
    }

    #[test]
    fn test_validate_skips_disabled_stores() {
        let mut config = Config::parse_json(MINIMAL).unwrap();
        config.permissions_db.enabled = false;
        config.permissions_db.table_name = "not valid".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_checks_total_spent_field() {
        let mut config = Config::parse_json(MINIMAL).unwrap();
        config.points_db.enabled = true;
        config.points_db.total_spent_field = "TotalSpent".to_string();
        assert!(config.validate().is_ok());

        config.points_db.total_spent_field = "Total Spent".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PointsDBSettings.TotalSpentField"));
    }

    #[test]
    fn test_load_reads_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, MINIMAL).unwrap();
        assert_eq!(Config::load(&json_path).unwrap().plugin_db.table_name, "Players");

        let toml_path = dir.path().join("config.toml");
        std::fs::write(&toml_path, "[PluginDBSettings]\nTableName = \"P2\"\n").unwrap();
        assert_eq!(Config::load(&toml_path).unwrap().plugin_db.table_name, "P2");

        let missing = Config::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(PluginError::Config(_))));
    }

    #[test]
    fn test_plugin_paths() {
        let paths = PluginPaths::new("/srv/ark", "PluginTemplate");
        assert_eq!(
            paths.plugin_dir(),
            PathBuf::from("/srv/ark/ArkApi/Plugins/PluginTemplate")
        );
        assert_eq!(
            paths.config_path(),
            PathBuf::from("/srv/ark/ArkApi/Plugins/PluginTemplate/config.json")
        );
        assert_eq!(
            paths.default_database_path(),
            PathBuf::from("/srv/ark/ArkApi/Plugins/PluginTemplate/PluginTemplate.db")
        );
        assert_eq!(
            paths.default_log_path(),
            PathBuf::from("/srv/ark/ArkApi/Plugins/PluginTemplate/logs/PluginTemplate.log")
        );
    }
}
