//! Raw connection seam shared by the backends.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::{Database, Encode, Type};

use super::{Row, SqlValue, Statement};

/// A single live database connection.
///
/// Errors are returned as raw `sqlx::Error` so the connector can tell a lost
/// connection from a failed statement.
#[async_trait]
pub trait Link: Send {
    /// Run a statement that returns no rows.
    async fn execute(&mut self, statement: &Statement) -> Result<u64, sqlx::Error>;

    /// Run a statement and materialize its rows.
    async fn fetch(&mut self, statement: &Statement) -> Result<Vec<Row>, sqlx::Error>;
}

/// Opens [`Link`]s; used for the first connection and for reconnects.
#[async_trait]
pub trait Dialer: Send + Sync {
    type Link: Link;

    /// Open a new connection.
    async fn dial(&self) -> Result<Self::Link, sqlx::Error>;
}

/// Bind `params` to `query` in order.
pub(crate) fn bind_params<'q, DB>(
    mut query: Query<'q, DB, <DB as Database>::Arguments<'q>>,
    params: &[SqlValue],
) -> Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    String: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            SqlValue::Text(text) => query.bind(text.clone()),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Null => query.bind(None::<String>),
        };
    }
    query
}
