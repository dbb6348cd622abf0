//! Test helpers for integration tests.
//!
//! Every store is an in-memory SQLite database seeded through the public
//! connector API.

#![allow(dead_code)]

use std::sync::Arc;

use ark_plugin_template::config::{
    CommandSettings, ConnectionSettings, PermissionGroup, PermissionGroups, PermissionsDbSettings,
    PluginDbSettings, PointsDbSettings,
};
use ark_plugin_template::db::SqliteConnector;
use ark_plugin_template::{AppContext, Config, Connector, SqlValue, TableDefinition};

/// Points table used by the tests (default names).
pub const POINTS_TABLE: &str = "ArkShopPlayers";

/// Permissions table used by the tests (default names).
pub const PERMISSIONS_TABLE: &str = "Players";

/// Open a fresh in-memory store.
pub async fn memory_db() -> Arc<dyn Connector> {
    Arc::new(SqliteConnector::open_in_memory().await)
}

/// Create the points table and insert `(player, balance, total spent)` rows.
pub async fn seed_points(db: &dyn Connector, accounts: &[(&str, Option<i64>, Option<i64>)]) {
    let definition = TableDefinition::new()
        .column("EosId", "TEXT NOT NULL")
        .column("Points", "INTEGER")
        .column("TotalSpent", "INTEGER");
    db.create_table_if_not_exist(POINTS_TABLE, &definition)
        .await
        .unwrap();
    for (player, points, total) in accounts {
        db.create(
            POINTS_TABLE,
            &[
                ("EosId", SqlValue::from(*player)),
                ("Points", SqlValue::from(*points)),
                ("TotalSpent", SqlValue::from(*total)),
            ],
        )
        .await
        .unwrap();
    }
}

/// Create the permissions table and insert `(player, group list)` rows.
pub async fn seed_permissions(db: &dyn Connector, players: &[(&str, Option<&str>)]) {
    let definition = TableDefinition::new()
        .column("EOS_Id", "TEXT NOT NULL")
        .column("PermissionGroups", "TEXT");
    db.create_table_if_not_exist(PERMISSIONS_TABLE, &definition)
        .await
        .unwrap();
    for (player, groups) in players {
        db.create(
            PERMISSIONS_TABLE,
            &[
                ("EOS_Id", SqlValue::from(*player)),
                ("PermissionGroups", SqlValue::from(*groups)),
            ],
        )
        .await
        .unwrap();
    }
}

/// Read a player's `(Points, TotalSpent)` as stored.
pub async fn stored_points(db: &dyn Connector, player: &str) -> (String, String) {
    let rows = db
        .read(
            &ark_plugin_template::Query::select(POINTS_TABLE)
                .filter(ark_plugin_template::Filter::eq("EosId", player)),
        )
        .await
        .unwrap();
    let row = &rows[0];
    (row["Points"].clone(), row["TotalSpent"].clone())
}

/// Groups used across the tests.
///
/// Default (999): RepairItemCMD free.
/// VIP (5): RepairItemCMD cost 10, DeletePlayerCMD cost 0.
/// Admins (1): RepairItemCMD cost 50 with a custom points message.
/// Muted (0): RepairItemCMD disabled.
pub fn test_groups() -> PermissionGroups {
    let mut groups = PermissionGroups::new();
    groups.insert(
        "Default".to_string(),
        PermissionGroup::with_priority(999)
            .command("RepairItemCMD", CommandSettings::enabled_with_cost(0)),
    );
    groups.insert(
        "VIP".to_string(),
        PermissionGroup::with_priority(5)
            .command("RepairItemCMD", CommandSettings::enabled_with_cost(10))
            .command("DeletePlayerCMD", CommandSettings::enabled_with_cost(0)),
    );
    let mut admin_repair = CommandSettings::enabled_with_cost(50);
    admin_repair.extra.insert(
        "PointsErrorMSG".to_string(),
        serde_json::Value::String("Admins pay 50.".to_string()),
    );
    groups.insert(
        "Admins".to_string(),
        PermissionGroup::with_priority(1).command("RepairItemCMD", admin_repair),
    );
    groups.insert(
        "Muted".to_string(),
        PermissionGroup::with_priority(0).command("RepairItemCMD", CommandSettings::default()),
    );
    groups
}

/// Configuration with every store on SQLite and points enabled.
pub fn test_config() -> Config {
    Config {
        plugin_db: PluginDbSettings {
            connection: ConnectionSettings::sqlite(""),
            table_name: "PluginPlayers".to_string(),
        },
        permissions_db: PermissionsDbSettings {
            connection: ConnectionSettings::sqlite(""),
            ..PermissionsDbSettings::default()
        },
        points_db: PointsDbSettings {
            enabled: true,
            connection: ConnectionSettings::sqlite(""),
            ..PointsDbSettings::default()
        },
        permission_groups: test_groups(),
        ..Config::default()
    }
}

/// Stores behind a test context.
pub struct Stores {
    pub plugin: Arc<dyn Connector>,
    pub permissions: Arc<dyn Connector>,
    pub points: Arc<dyn Connector>,
}

/// Context over fresh in-memory stores with seeded permissions and points.
pub async fn setup_context(
    permissions: &[(&str, Option<&str>)],
    accounts: &[(&str, Option<i64>, Option<i64>)],
) -> (AppContext, Stores) {
    let stores = Stores {
        plugin: memory_db().await,
        permissions: memory_db().await,
        points: memory_db().await,
    };
    seed_permissions(stores.permissions.as_ref(), permissions).await;
    seed_points(stores.points.as_ref(), accounts).await;
    let context = AppContext::from_parts(
        test_config(),
        stores.plugin.clone(),
        Some(stores.permissions.clone()),
        Some(stores.points.clone()),
    )
    .await
    .unwrap();
    (context, stores)
}
