//! Connector factory.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use super::Connector;
use crate::config::{ConnectionSettings, PluginPaths};
#[cfg(not(all(feature = "mysql", feature = "sqlite")))]
use crate::PluginError;
use crate::Result;

/// Database file for an SQLite-backed store: the configured path, or the
/// plugin's default database file when none is configured.
pub fn sqlite_path(settings: &ConnectionSettings, paths: &PluginPaths) -> PathBuf {
    if settings.sqlite_path.is_empty() {
        paths.default_database_path()
    } else {
        PathBuf::from(&settings.sqlite_path)
    }
}

/// Build the connector for one store.
///
/// A backend that fails to connect still yields a connector (whose
/// operations fail); only a backend compiled out of this build is an error.
pub async fn create_connector(
    settings: &ConnectionSettings,
    paths: &PluginPaths,
) -> Result<Arc<dyn Connector>> {
    if settings.use_mysql {
        open_mysql(settings).await
    } else {
        let path = sqlite_path(settings, paths);
        info!("Using SQLite database {:?}", path);
        open_sqlite(path).await
    }
}

#[cfg(feature = "mysql")]
async fn open_mysql(settings: &ConnectionSettings) -> Result<Arc<dyn Connector>> {
    Ok(Arc::new(super::MySqlConnector::connect(settings).await))
}

#[cfg(not(feature = "mysql"))]
async fn open_mysql(_settings: &ConnectionSettings) -> Result<Arc<dyn Connector>> {
    Err(PluginError::Unsupported(
        "MySQL support is not compiled in (enable the `mysql` feature)".to_string(),
    ))
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(path: PathBuf) -> Result<Arc<dyn Connector>> {
    Ok(Arc::new(super::SqliteConnector::open(path).await))
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_path: PathBuf) -> Result<Arc<dyn Connector>> {
    Err(PluginError::Unsupported(
        "SQLite support is not compiled in (enable the `sqlite` feature)".to_string(),
    ))
}
