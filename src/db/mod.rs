//! Database module for the plugin.
//!
//! A [`Connector`] owns one connection to one logical store (plugin data,
//! permissions or points). MySQL and SQLite backends implement the
//! low-level primitives; the table and row helpers are shared and built on
//! the statements from [`statement`].
//!
//! Every connector serializes its own operations; connectors are
//! independent of each other.

mod factory;
mod link;
#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod statement;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

pub use factory::{create_connector, sqlite_path};
pub use link::{Dialer, Link};
#[cfg(feature = "mysql")]
pub use mysql::{ssl_mode_from_setting, MySqlConnector, MySqlDialer};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnector;
pub use statement::{
    validate_identifier, Assignment, Dialect, Filter, Op, Query, SqlValue, Statement,
    TableDefinition,
};

use crate::Result;

/// One result row: column name to the value's text form.
pub type Row = BTreeMap<String, String>;

/// Text form of SQL NULL in a [`Row`].
pub const NULL_TEXT: &str = "NULL";

/// Storage connector for one logical store.
///
/// Backends implement the primitives (`execute`, `fetch`, `reorder_columns`,
/// `escape_string`, connection state). The table and row helpers are
/// provided on top of them.
#[async_trait]
pub trait Connector: Send + Sync {
    /// SQL flavour of this backend.
    fn dialect(&self) -> Dialect;

    /// Returns the name of the database backend.
    fn backend_name(&self) -> &'static str {
        self.dialect().as_str()
    }

    /// Whether the connector currently holds a live connection.
    async fn is_connected(&self) -> bool;

    /// Run a statement that returns no rows. Returns the affected row count.
    async fn execute(&self, statement: &Statement) -> Result<u64>;

    /// Run a statement and materialize every row.
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>>;

    /// Reorder the columns of an existing table to match `definition`.
    async fn reorder_columns(&self, table: &str, definition: &TableDefinition) -> Result<()>;

    /// Escape a value for embedding in a single-quoted literal of this
    /// backend's SQL. Only needed for [`Query::Raw`].
    fn escape_string(&self, value: &str) -> String;

    /// Drop the connection. Later operations fail.
    async fn close(&self);

    /// Column names of `table`, in table order. Empty if the table does not
    /// exist.
    async fn columns(&self, table: &str) -> Result<Vec<String>> {
        let statement = statement::list_columns(self.dialect(), table)?;
        let rows = self.fetch(&statement).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("name"))
            .collect())
    }

    /// Create `table` with `definition`. No-op if the table exists.
    async fn create_table_if_not_exist(
        &self,
        table: &str,
        definition: &TableDefinition,
    ) -> Result<()> {
        let statement = statement::create_table(table, definition)?;
        self.execute(&statement).await?;
        Ok(())
    }

    /// Add every column of `definition` that `table` does not have yet.
    async fn alter_table_if_not_exists(
        &self,
        table: &str,
        definition: &TableDefinition,
    ) -> Result<()> {
        let existing = self.columns(table).await?;
        let missing = definition.without_existing(&existing);
        if missing.is_empty() {
            debug!(table = %table, "no columns to add");
            return Ok(());
        }
        for statement in statement::add_columns(self.dialect(), table, &missing)? {
            self.execute(&statement).await?;
        }
        Ok(())
    }

    /// Insert one row.
    async fn create(&self, table: &str, values: &[(&str, SqlValue)]) -> Result<()> {
        let statement = statement::insert(table, values)?;
        self.execute(&statement).await?;
        Ok(())
    }

    /// Run a query and return all rows.
    async fn read(&self, query: &Query) -> Result<Vec<Row>> {
        let statement = statement::select(query)?;
        self.fetch(&statement).await
    }

    /// Update the rows matching `filters`. Returns the affected row count.
    async fn update(
        &self,
        table: &str,
        assignments: &[Assignment],
        filters: &[Filter],
    ) -> Result<u64> {
        let statement = statement::update(table, assignments, filters)?;
        self.execute(&statement).await
    }

    /// Delete the rows matching `filters`. Returns the affected row count.
    async fn delete_row(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        let statement = statement::delete(table, filters)?;
        self.execute(&statement).await
    }
}
