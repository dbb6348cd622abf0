//! SQLite connector.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row as _, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::link::{bind_params, Link};
use super::statement::escape_sqlite;
use super::{Connector, Dialect, Row, Statement, TableDefinition, NULL_TEXT};
use crate::{PluginError, Result};

const NOT_CONNECTED: &str = "sqlite database is not open";

/// Connector backed by one SQLite file connection.
pub struct SqliteConnector {
    path: PathBuf,
    conn: Mutex<Option<SqliteConnection>>,
}

impl SqliteConnector {
    /// Open (creating if missing) the database file at `path`.
    ///
    /// A failure is logged and yields a connector whose operations all fail.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        info!("Opening SQLite database at {:?}", path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(error = %e, "cannot create database directory {:?}", parent);
                }
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        Self::connect(path, options).await
    }

    /// Open a private in-memory database (for tests).
    pub async fn open_in_memory() -> Self {
        debug!("Opening in-memory SQLite database");
        let path = PathBuf::from(":memory:");
        match SqliteConnectOptions::from_str("sqlite::memory:") {
            Ok(options) => Self::connect(path, options).await,
            Err(e) => {
                error!(error = %e, "invalid in-memory SQLite options");
                Self {
                    path,
                    conn: Mutex::new(None),
                }
            }
        }
    }

    async fn connect(path: PathBuf, options: SqliteConnectOptions) -> Self {
        let conn = match options.connect().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!(error = %e, "failed to open SQLite database {:?}", path);
                None
            }
        };
        Self {
            path,
            conn: Mutex::new(conn),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| PluginError::DatabaseConnection(NOT_CONNECTED.to_string()))?;
        Link::execute(conn, statement).await.map_err(|e| {
            error!(error = %e, sql = %statement.sql, "SQLite statement failed");
            e.into()
        })
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| PluginError::DatabaseConnection(NOT_CONNECTED.to_string()))?;
        Link::fetch(conn, statement).await.map_err(|e| {
            error!(error = %e, sql = %statement.sql, "SQLite query failed");
            e.into()
        })
    }

    async fn reorder_columns(&self, table: &str, _definition: &TableDefinition) -> Result<()> {
        warn!(table = %table, "column reordering is not supported on SQLite");
        Err(PluginError::Unsupported(format!(
            "reorder columns of {table} on sqlite"
        )))
    }

    fn escape_string(&self, value: &str) -> String {
        escape_sqlite(value)
    }

    async fn close(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            if let Err(e) = conn.close().await {
                warn!(error = %e, "error closing SQLite database {:?}", self.path);
            }
        }
    }
}

#[async_trait]
impl Link for SqliteConnection {
    async fn execute(&mut self, statement: &Statement) -> std::result::Result<u64, sqlx::Error> {
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        Ok(query.execute(&mut *self).await?.rows_affected())
    }

    async fn fetch(&mut self, statement: &Statement) -> std::result::Result<Vec<Row>, sqlx::Error> {
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        let rows = query.fetch_all(&mut *self).await?;
        rows.iter().map(materialize).collect()
    }
}

fn materialize(row: &SqliteRow) -> std::result::Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for column in row.columns() {
        out.insert(column.name().to_string(), cell_text(row, column.ordinal())?);
    }
    Ok(out)
}

/// Text form of one cell, by its storage class.
fn cell_text(row: &SqliteRow, index: usize) -> std::result::Result<String, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(NULL_TEXT.to_string());
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let text = match type_name.as_str() {
        "INTEGER" | "INT" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index)?.to_string(),
        "REAL" | "FLOAT" | "NUMERIC" => row.try_get_unchecked::<f64, _>(index)?.to_string(),
        "BLOB" => String::from_utf8_lossy(&row.try_get_unchecked::<Vec<u8>, _>(index)?).into_owned(),
        _ => row.try_get_unchecked::<String, _>(index)?,
    };
    Ok(text)
}
