//! MySQL connector with reconnect-on-loss.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow, MySqlSslMode};
use sqlx::{Column, ConnectOptions, Row as _, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::link::{bind_params, Dialer, Link};
use super::statement::{self, escape_mysql};
use super::{Connector, Dialect, Row, Statement, TableDefinition, NULL_TEXT};
use crate::config::ConnectionSettings;
use crate::{PluginError, Result};

/// Server error numbers that mean the server is dropping the connection:
/// ER_SERVER_SHUTDOWN and ER_CLIENT_INTERACTION_TIMEOUT.
///
/// Client-side losses (CR_SERVER_GONE_ERROR, CR_SERVER_LOST) never arrive as
/// database errors; the driver reports them as I/O errors.
const CONNECTION_LOST_ERRORS: [u16; 2] = [1053, 4031];

const NOT_CONNECTED: &str = "mysql connection was never established";

/// Map the numeric `MysqlSSLMode` setting to an SSL mode.
///
/// 0..=4 are DISABLED, PREFERRED, REQUIRED, VERIFY_CA and VERIFY_IDENTITY.
/// Anything else leaves the client default.
pub fn ssl_mode_from_setting(mode: i32) -> Option<MySqlSslMode> {
    match mode {
        0 => Some(MySqlSslMode::Disabled),
        1 => Some(MySqlSslMode::Preferred),
        2 => Some(MySqlSslMode::Required),
        3 => Some(MySqlSslMode::VerifyCa),
        4 => Some(MySqlSslMode::VerifyIdentity),
        _ => None,
    }
}

/// Whether `err` means the connection must be re-established.
pub(crate) fn is_connection_lost(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .is_some_and(|e| is_connection_lost_number(e.number())),
        _ => false,
    }
}

fn is_connection_lost_number(number: u16) -> bool {
    CONNECTION_LOST_ERRORS.contains(&number)
}

/// Whether a TLS version was configured alongside disabled SSL.
fn tls_version_conflicts(settings: &ConnectionSettings) -> bool {
    settings.ssl_mode == 0 && !settings.tls_version.is_empty()
}

/// Dials real MySQL servers.
pub struct MySqlDialer {
    options: MySqlConnectOptions,
}

impl MySqlDialer {
    /// Build connect options from the store's settings.
    pub fn new(settings: &ConnectionSettings) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password);
        if !settings.database.is_empty() {
            options = options.database(&settings.database);
        }
        if let Some(mode) = ssl_mode_from_setting(settings.ssl_mode) {
            options = options.ssl_mode(mode);
        }
        if tls_version_conflicts(settings) {
            warn!(
                tls_version = %settings.tls_version,
                "MysqlTLSVersion is set but MysqlSSLMode 0 disables SSL"
            );
        } else if !settings.tls_version.is_empty() {
            warn!(
                tls_version = %settings.tls_version,
                "MysqlTLSVersion cannot be pinned; the TLS library negotiates the version"
            );
        }
        Self { options }
    }
}

#[async_trait]
impl Dialer for MySqlDialer {
    type Link = MySqlConnection;

    async fn dial(&self) -> std::result::Result<MySqlConnection, sqlx::Error> {
        self.options.connect().await
    }
}

struct Session<L> {
    link: Option<L>,
    /// Set once the first dial succeeded. A connector that never connected
    /// stays unusable; one that lost its link redials.
    established: bool,
}

enum Call<'a> {
    Execute(&'a Statement),
    Fetch(&'a Statement),
}

enum Outcome {
    Affected(u64),
    Rows(Vec<Row>),
}

impl Call<'_> {
    fn sql(&self) -> &str {
        match self {
            Call::Execute(s) | Call::Fetch(s) => &s.sql,
        }
    }

    async fn run<L: Link>(&self, link: &mut L) -> std::result::Result<Outcome, sqlx::Error> {
        match self {
            Call::Execute(s) => link.execute(s).await.map(Outcome::Affected),
            Call::Fetch(s) => link.fetch(s).await.map(Outcome::Rows),
        }
    }
}

/// Connector backed by one MySQL server connection.
///
/// When a statement fails because the connection is gone, the connector
/// reconnects once and retries that statement once.
pub struct MySqlConnector<D: Dialer = MySqlDialer> {
    dialer: D,
    session: Mutex<Session<D::Link>>,
}

impl MySqlConnector<MySqlDialer> {
    /// Connect with the store's settings.
    ///
    /// A failure is logged and yields a connector whose operations all fail.
    pub async fn connect(settings: &ConnectionSettings) -> Self {
        info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            "Connecting to MySQL"
        );
        Self::with_dialer(MySqlDialer::new(settings)).await
    }
}

impl<D: Dialer> MySqlConnector<D> {
    /// Connect through `dialer`.
    pub async fn with_dialer(dialer: D) -> Self {
        let link = match dialer.dial().await {
            Ok(link) => Some(link),
            Err(e) => {
                error!(error = %e, "failed to connect to MySQL");
                None
            }
        };
        let established = link.is_some();
        Self {
            dialer,
            session: Mutex::new(Session { link, established }),
        }
    }

    async fn redial(&self) -> Result<D::Link> {
        self.dialer.dial().await.map_err(|e| {
            error!(error = %e, "failed to reconnect to MySQL");
            PluginError::DatabaseConnection(e.to_string())
        })
    }

    /// Run `call`, reconnecting at most once.
    async fn dispatch(&self, call: Call<'_>) -> Result<Outcome> {
        let mut session = self.session.lock().await;
        let mut redialed = false;
        if session.link.is_none() {
            if !session.established {
                return Err(PluginError::DatabaseConnection(NOT_CONNECTED.to_string()));
            }
            session.link = Some(self.redial().await?);
            redialed = true;
        }

        let first = match session.link.as_mut() {
            Some(link) => call.run(link).await,
            None => return Err(PluginError::DatabaseConnection(NOT_CONNECTED.to_string())),
        };
        let err = match first {
            Ok(outcome) => return Ok(outcome),
            Err(e) => e,
        };
        if !is_connection_lost(&err) {
            error!(error = %err, sql = %call.sql(), "MySQL statement failed");
            return Err(err.into());
        }
        if redialed {
            session.link = None;
            error!(error = %err, sql = %call.sql(), "MySQL connection lost again after reconnect");
            return Err(err.into());
        }

        warn!(error = %err, "MySQL connection lost, reconnecting");
        session.link = None;
        let mut link = self.redial().await?;
        let retried = call.run(&mut link).await;
        session.link = Some(link);
        retried.map_err(|e| {
            error!(error = %e, sql = %call.sql(), "MySQL statement failed after reconnect");
            e.into()
        })
    }
}

#[async_trait]
impl<D: Dialer> Connector for MySqlConnector<D> {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn is_connected(&self) -> bool {
        self.session.lock().await.link.is_some()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        match self.dispatch(Call::Execute(statement)).await? {
            Outcome::Affected(n) => Ok(n),
            Outcome::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>> {
        match self.dispatch(Call::Fetch(statement)).await? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Affected(_) => Ok(Vec::new()),
        }
    }

    async fn reorder_columns(&self, table: &str, definition: &TableDefinition) -> Result<()> {
        let statement = statement::reorder_columns(table, definition)?;
        self.execute(&statement).await?;
        Ok(())
    }

    fn escape_string(&self, value: &str) -> String {
        escape_mysql(value)
    }

    async fn close(&self) {
        let mut session = self.session.lock().await;
        session.established = false;
        if session.link.take().is_some() {
            info!("MySQL connection closed");
        }
    }
}

#[async_trait]
impl Link for MySqlConnection {
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

fn materialize(row: &MySqlRow) -> std::result::Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for column in row.columns() {
        out.insert(column.name().to_string(), cell_text(row, column.ordinal())?);
    }
    Ok(out)
}

/// Text form of one cell, by its column type.
fn cell_text(row: &MySqlRow, index: usize) -> std::result::Result<String, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(NULL_TEXT.to_string());
    }
    let text = match CellKind::of(raw.type_info().name()) {
        CellKind::Signed => row.try_get_unchecked::<i64, _>(index)?.to_string(),
        CellKind::Unsigned => row.try_get_unchecked::<u64, _>(index)?.to_string(),
        CellKind::Float => row.try_get_unchecked::<f32, _>(index)?.to_string(),
        CellKind::Double => row.try_get_unchecked::<f64, _>(index)?.to_string(),
        CellKind::DateTime => row
            .try_get_unchecked::<NaiveDateTime, _>(index)?
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        CellKind::Date => row
            .try_get_unchecked::<NaiveDate, _>(index)?
            .format("%Y-%m-%d")
            .to_string(),
        CellKind::Time => row
            .try_get_unchecked::<NaiveTime, _>(index)?
            .format("%H:%M:%S")
            .to_string(),
        CellKind::Bytes => {
            String::from_utf8_lossy(&row.try_get_unchecked::<Vec<u8>, _>(index)?).into_owned()
        }
        CellKind::Text => row.try_get_unchecked::<String, _>(index)?,
    };
    Ok(text)
}

/// How a MySQL column type is decoded before it is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Signed,
    Unsigned,
    Float,
    Double,
    DateTime,
    Date,
    Time,
    Bytes,
    Text,
}

impl CellKind {
    fn of(type_name: &str) -> Self {
        // Unsigned values must not go through the signed decoder, which
        // sign-extends narrow integers.
        if type_name.ends_with(" UNSIGNED") || type_name == "BIT" {
            return CellKind::Unsigned;
        }
        match type_name {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                CellKind::Signed
            }
            "FLOAT" => CellKind::Float,
            "DOUBLE" => CellKind::Double,
            "DATETIME" | "TIMESTAMP" => CellKind::DateTime,
            "DATE" => CellKind::Date,
            "TIME" => CellKind::Time,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
                CellKind::Bytes
            }
            _ => CellKind::Text,
        }
    }
}
