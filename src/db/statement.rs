//! SQL statement builder.
//!
//! Pure functions that turn table definitions, column/value pairs and
//! predicates into statement text plus bound parameters. Values never end up
//! in the SQL text; identifiers are checked before they do.

use std::fmt;

use tracing::warn;

use crate::{PluginError, Result};

/// SQL flavour of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// MySQL / MariaDB server.
    MySql,
    /// SQLite file.
    Sqlite,
}

impl Dialect {
    /// Backend name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// SQL NULL.
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Ordered column definitions: column name to type/constraint text.
///
/// Column names are unique; inserting a name twice replaces its type and
/// keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDefinition {
    columns: Vec<(String, String)>,
}

impl TableDefinition {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`TableDefinition::insert`].
    pub fn column(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.insert(name, definition);
        self
    }

    /// Add a column, or replace the definition of an existing one.
    pub fn insert(&mut self, name: impl Into<String>, definition: impl Into<String>) {
        let name = name.into();
        let definition = definition.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = definition,
            None => self.columns.push((name, definition)),
        }
    }

    /// Whether a column with this name is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// `(name, definition)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(n, d)| (n.as_str(), d.as_str()))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the definition has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Real columns only, without key and index entries.
    pub fn columns_only(&self) -> TableDefinition {
        self.columns
            .iter()
            .filter(|(name, _)| !is_constraint_entry(name))
            .cloned()
            .collect()
    }

    /// The real columns whose names are not in `existing` (case-insensitive,
    /// as both MySQL and SQLite treat column names). Key and index entries
    /// are never reported missing.
    pub fn without_existing(&self, existing: &[String]) -> TableDefinition {
        self.columns
            .iter()
            .filter(|(name, _)| !is_constraint_entry(name))
            .filter(|(name, _)| !existing.iter().any(|e| e.eq_ignore_ascii_case(name)))
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TableDefinition {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut definition = TableDefinition::new();
        for (name, ty) in iter {
            definition.insert(name, ty);
        }
        definition
    }
}

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }
}

/// Parameterized predicate `column <op> ?`. Filters are AND-combined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: Op,
    pub value: SqlValue,
}

impl Filter {
    /// Create a filter.
    pub fn new(column: impl Into<String>, op: Op, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Eq, value)
    }

    /// `column <> value`.
    pub fn ne(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Ne, value)
    }

    /// `column < value`.
    pub fn lt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Lt, value)
    }

    /// `column <= value`.
    pub fn le(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Le, value)
    }

    /// `column > value`.
    pub fn gt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Gt, value)
    }

    /// `column >= value`.
    pub fn ge(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, Op::Ge, value)
    }
}

/// One item of an UPDATE's SET clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// `column = ?`
    Set(String, SqlValue),
    /// `column = COALESCE(column, 0) + ?`
    Increment(String, i64),
    /// `column = COALESCE(column, 0) - ?`
    Decrement(String, i64),
}

impl Assignment {
    /// `column = value`.
    pub fn set(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Assignment::Set(column.into(), value.into())
    }

    /// `column = column + amount`, treating NULL as 0.
    pub fn increment(column: impl Into<String>, amount: i64) -> Self {
        Assignment::Increment(column.into(), amount)
    }

    /// `column = column - amount`, treating NULL as 0.
    pub fn decrement(column: impl Into<String>, amount: i64) -> Self {
        Assignment::Decrement(column.into(), amount)
    }

    fn column(&self) -> &str {
        match self {
            Assignment::Set(c, _) | Assignment::Increment(c, _) | Assignment::Decrement(c, _) => c,
        }
    }
}

/// A read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// `SELECT * FROM table [WHERE filters] [LIMIT n]`.
    Select {
        table: String,
        filters: Vec<Filter>,
        limit: Option<u64>,
    },
    /// Caller-built SQL, executed as is. Values spliced into it must go
    /// through the connector's `escape_string`.
    Raw(String),
}

impl Query {
    /// Start a structured SELECT on `table`.
    pub fn select(table: impl Into<String>) -> Self {
        Query::Select {
            table: table.into(),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Raw SQL.
    pub fn raw(sql: impl Into<String>) -> Self {
        Query::Raw(sql.into())
    }

    /// Add a filter. No effect on raw queries.
    pub fn filter(mut self, filter: Filter) -> Self {
        if let Query::Select { filters, .. } = &mut self {
            filters.push(filter);
        }
        self
    }

    /// Limit the row count. No effect on raw queries.
    pub fn limit(mut self, n: u64) -> Self {
        if let Query::Select { limit, .. } = &mut self {
            *limit = Some(n);
        }
        self
    }
}

/// Statement text plus its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// A statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// A statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Check that `name` can be spliced into SQL as a table or column name.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        warn!(identifier = %name, "rejected SQL identifier");
        Err(PluginError::Validation(format!(
            "invalid SQL identifier: {name:?}"
        )))
    }
}

/// Whether a definition entry is a table constraint rather than a column,
/// such as `("PRIMARY", "KEY(Id)")` or `("UNIQUE", "INDEX ...")`.
pub fn is_constraint_entry(name: &str) -> bool {
    const KEYWORDS: [&str; 6] = ["PRIMARY", "UNIQUE", "KEY", "INDEX", "CONSTRAINT", "FOREIGN"];
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

fn validate_definition(table: &str, definition: &TableDefinition) -> Result<()> {
    validate_identifier(table)?;
    if definition.is_empty() {
        return Err(PluginError::Validation(format!(
            "no columns given for table {table}"
        )));
    }
    definition.names().try_for_each(validate_identifier)
}

fn push_where(sql: &mut String, params: &mut Vec<SqlValue>, filters: &[Filter]) -> Result<()> {
    for (i, filter) in filters.iter().enumerate() {
        validate_identifier(&filter.column)?;
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&filter.column);
        sql.push(' ');
        sql.push_str(filter.op.as_sql());
        sql.push_str(" ?");
        params.push(filter.value.clone());
    }
    Ok(())
}

fn require_filters(action: &str, table: &str, filters: &[Filter]) -> Result<()> {
    if filters.is_empty() {
        warn!(table = %table, "{action} without a condition rejected");
        return Err(PluginError::Validation(format!(
            "{action} on {table} requires at least one filter"
        )));
    }
    Ok(())
}

/// `CREATE TABLE IF NOT EXISTS table (col def, ...)`.
pub fn create_table(table: &str, definition: &TableDefinition) -> Result<Statement> {
    validate_definition(table, definition)?;
    let columns = definition
        .iter()
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {table} ({columns})"
    )))
}

/// ADD COLUMN statements for every column in `definition`. Key and index
/// entries are skipped.
///
/// MySQL gets a single combined ALTER; SQLite accepts one ADD COLUMN per
/// ALTER, so it gets one statement per column.
pub fn add_columns(
    dialect: Dialect,
    table: &str,
    definition: &TableDefinition,
) -> Result<Vec<Statement>> {
    let definition = definition.columns_only();
    validate_definition(table, &definition)?;
    let clauses = definition
        .iter()
        .map(|(name, ty)| format!("ADD COLUMN {name} {ty}"));
    Ok(match dialect {
        Dialect::MySql => vec![Statement::new(format!(
            "ALTER TABLE {table} {}",
            clauses.collect::<Vec<_>>().join(", ")
        ))],
        Dialect::Sqlite => clauses
            .map(|clause| Statement::new(format!("ALTER TABLE {table} {clause}")))
            .collect(),
    })
}

/// MySQL column reordering:
/// `ALTER TABLE t MODIFY a A FIRST, MODIFY b B AFTER a, ...`.
/// Key and index entries are skipped.
pub fn reorder_columns(table: &str, definition: &TableDefinition) -> Result<Statement> {
    let definition = definition.columns_only();
    validate_definition(table, &definition)?;
    let mut clauses = Vec::with_capacity(definition.len());
    let mut previous: Option<&str> = None;
    for (name, ty) in definition.iter() {
        match previous {
            None => clauses.push(format!("MODIFY {name} {ty} FIRST")),
            Some(prev) => clauses.push(format!("MODIFY {name} {ty} AFTER {prev}")),
        }
        previous = Some(name);
    }
    Ok(Statement::new(format!(
        "ALTER TABLE {table} {}",
        clauses.join(", ")
    )))
}

/// `INSERT INTO table (a, b) VALUES (?, ?)`.
pub fn insert(table: &str, values: &[(&str, SqlValue)]) -> Result<Statement> {
    validate_identifier(table)?;
    if values.is_empty() {
        return Err(PluginError::Validation(format!(
            "no values given for insert into {table}"
        )));
    }
    let mut columns = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (column, value) in values {
        validate_identifier(column)?;
        columns.push(*column);
        params.push(value.clone());
    }
    let placeholders = vec!["?"; values.len()].join(", ");
    Ok(Statement::with_params(
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        ),
        params,
    ))
}

/// `UPDATE table SET ... WHERE ...`. At least one filter is required.
pub fn update(table: &str, assignments: &[Assignment], filters: &[Filter]) -> Result<Statement> {
    validate_identifier(table)?;
    if assignments.is_empty() {
        return Err(PluginError::Validation(format!(
            "no assignments given for update of {table}"
        )));
    }
    require_filters("update", table, filters)?;

    let mut sql = format!("UPDATE {table} SET ");
    let mut params = Vec::new();
    for (i, assignment) in assignments.iter().enumerate() {
        let column = assignment.column();
        validate_identifier(column)?;
        if i > 0 {
            sql.push_str(", ");
        }
        match assignment {
            Assignment::Set(_, value) => {
                sql.push_str(&format!("{column} = ?"));
                params.push(value.clone());
            }
            Assignment::Increment(_, amount) => {
                sql.push_str(&format!("{column} = COALESCE({column}, 0) + ?"));
                params.push(SqlValue::Int(*amount));
            }
            Assignment::Decrement(_, amount) => {
                sql.push_str(&format!("{column} = COALESCE({column}, 0) - ?"));
                params.push(SqlValue::Int(*amount));
            }
        }
    }
    push_where(&mut sql, &mut params, filters)?;
    Ok(Statement::with_params(sql, params))
}

/// `DELETE FROM table WHERE ...`. At least one filter is required.
pub fn delete(table: &str, filters: &[Filter]) -> Result<Statement> {
    validate_identifier(table)?;
    require_filters("delete", table, filters)?;
    let mut sql = format!("DELETE FROM {table}");
    let mut params = Vec::new();
    push_where(&mut sql, &mut params, filters)?;
    Ok(Statement::with_params(sql, params))
}

/// Statement for a [`Query`].
pub fn select(query: &Query) -> Result<Statement> {
    match query {
        Query::Raw(sql) => Ok(Statement::new(sql.clone())),
        Query::Select {
            table,
            filters,
            limit,
        } => {
            validate_identifier(table)?;
            let mut sql = format!("SELECT * FROM {table}");
            let mut params = Vec::new();
            push_where(&mut sql, &mut params, filters)?;
            if let Some(n) = limit {
                sql.push_str(&format!(" LIMIT {n}"));
            }
            Ok(Statement::with_params(sql, params))
        }
    }
}

/// Column names of `table`, one row per column with the name in `name`.
pub fn list_columns(dialect: Dialect, table: &str) -> Result<Statement> {
    validate_identifier(table)?;
    let sql = match dialect {
        Dialect::MySql => {
            "SELECT COLUMN_NAME AS name FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"
        }
        Dialect::Sqlite => "SELECT name FROM pragma_table_info(?)",
    };
    Ok(Statement::with_params(sql, vec![SqlValue::from(table)]))
}

/// Escape a value for a single-quoted MySQL string literal, the way
/// `mysql_real_escape_string` does without NO_BACKSLASH_ESCAPES.
pub fn escape_mysql(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() * 2);
    for c in value.chars() {
        match c {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\x1a' => escaped.push_str("\\Z"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape a value for a single-quoted SQLite string literal.
///
/// SQLite has no backslash escapes; only the quote is doubled.
pub fn escape_sqlite(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_table() -> TableDefinition {
        TableDefinition::new()
            .column("Id", "INT NOT NULL AUTO_INCREMENT")
            .column("EosId", "VARCHAR(50) NOT NULL")
            .column("PRIMARY", "KEY(Id)")
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("Players").is_ok());
        assert!(validate_identifier("_tmp_1").is_ok());
        assert!(validate_identifier("EOS_Id").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("Players; DROP TABLE x").is_err());
        assert!(validate_identifier("a b").is_err());
        assert!(validate_identifier("name'").is_err());
        assert!(validate_identifier("db.table").is_err());
    }

    #[test]
    fn test_table_definition_keeps_order_and_unique_names() {
        let mut def = TableDefinition::new().column("b", "INT").column("a", "TEXT");
        def.insert("b", "BIGINT");

        let pairs: Vec<_> = def.iter().collect();
        assert_eq!(pairs, vec![("b", "BIGINT"), ("a", "TEXT")]);
        assert_eq!(def.len(), 2);
        assert!(def.contains("a"));
        assert!(!def.contains("c"));
    }

    #[test]
    fn test_without_existing_is_case_insensitive() {
        let def = TableDefinition::new()
            .column("Id", "INT")
            .column("Name", "TEXT")
            .column("Score", "INT");
        let missing = def.without_existing(&["id".to_string(), "NAME".to_string()]);
        assert_eq!(missing.names().collect::<Vec<_>>(), vec!["Score"]);
    }

    #[test]
    fn test_constraint_entries_are_not_columns() {
        let def = player_table();
        assert!(is_constraint_entry("PRIMARY"));
        assert!(is_constraint_entry("unique"));
        assert!(!is_constraint_entry("EosId"));

        let missing = def.without_existing(&["Id".to_string(), "EosId".to_string()]);
        assert!(missing.is_empty());

        let stmts = add_columns(Dialect::MySql, "Players", &def).unwrap();
        assert_eq!(
            stmts[0].sql,
            "ALTER TABLE Players ADD COLUMN Id INT NOT NULL AUTO_INCREMENT, \
             ADD COLUMN EosId VARCHAR(50) NOT NULL"
        );
        let stmt = reorder_columns("Players", &def).unwrap();
        assert!(!stmt.sql.contains("PRIMARY"));
    }

    #[test]
    fn test_create_table() {
        let stmt = create_table("Players", &player_table()).unwrap();
        assert_eq!(
            stmt.sql,
            "CREATE TABLE IF NOT EXISTS Players (Id INT NOT NULL AUTO_INCREMENT, \
             EosId VARCHAR(50) NOT NULL, PRIMARY KEY(Id))"
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_create_table_rejects_empty_definition() {
        assert!(create_table("Players", &TableDefinition::new()).is_err());
        assert!(create_table("bad name", &player_table()).is_err());
    }

    #[test]
    fn test_add_columns_mysql_combines_clauses() {
        let def = TableDefinition::new().column("A", "INT").column("B", "TEXT");
        let stmts = add_columns(Dialect::MySql, "T", &def).unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].sql, "ALTER TABLE T ADD COLUMN A INT, ADD COLUMN B TEXT");
    }

    #[test]
    fn test_add_columns_sqlite_one_per_statement() {
        let def = TableDefinition::new().column("A", "INT").column("B", "TEXT");
        let stmts = add_columns(Dialect::Sqlite, "T", &def).unwrap();
        let sql: Vec<_> = stmts.iter().map(|s| s.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec!["ALTER TABLE T ADD COLUMN A INT", "ALTER TABLE T ADD COLUMN B TEXT"]
        );
    }

    #[test]
    fn test_reorder_columns() {
        let def = TableDefinition::new()
            .column("Name", "VARCHAR(50)")
            .column("Id", "INT NOT NULL")
            .column("Score", "INT");
        let stmt = reorder_columns("T", &def).unwrap();
        assert_eq!(
            stmt.sql,
            "ALTER TABLE T MODIFY Name VARCHAR(50) FIRST, MODIFY Id INT NOT NULL AFTER Name, \
             MODIFY Score INT AFTER Id"
        );
    }

    #[test]
    fn test_insert_binds_values() {
        let stmt = insert(
            "Players",
            &[("EosId", "O'Brien".into()), ("PlayerId", 42.into())],
        )
        .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO Players (EosId, PlayerId) VALUES (?, ?)");
        assert_eq!(
            stmt.params,
            vec![SqlValue::Text("O'Brien".to_string()), SqlValue::Int(42)]
        );
    }

    #[test]
    fn test_insert_rejects_bad_column() {
        let result = insert("Players", &[("EosId) VALUES ('x'); --", "v".into())]);
        assert!(matches!(result, Err(PluginError::Validation(_))));
        assert!(insert("Players", &[]).is_err());
    }

    #[test]
    fn test_update_with_arithmetic() {
        let stmt = update(
            "Shop",
            &[
                Assignment::decrement("Points", 4),
                Assignment::increment("TotalSpent", 4),
                Assignment::set("Note", "x"),
            ],
            &[Filter::eq("EosId", "p1"), Filter::ge("Points", 4)],
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE Shop SET Points = COALESCE(Points, 0) - ?, \
             TotalSpent = COALESCE(TotalSpent, 0) + ?, Note = ? WHERE EosId = ? AND Points >= ?"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Int(4),
                SqlValue::Int(4),
                SqlValue::Text("x".to_string()),
                SqlValue::Text("p1".to_string()),
                SqlValue::Int(4),
            ]
        );
    }

    #[test]
    fn test_update_and_delete_require_filters() {
        assert!(matches!(
            update("T", &[Assignment::set("a", 1)], &[]),
            Err(PluginError::Validation(_))
        ));
        assert!(matches!(delete("T", &[]), Err(PluginError::Validation(_))));
        assert!(update("T", &[], &[Filter::eq("a", 1)]).is_err());
    }

    #[test]
    fn test_delete() {
        let stmt = delete("Players", &[Filter::eq("EosId", "abc")]).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM Players WHERE EosId = ?");
        assert_eq!(stmt.params, vec![SqlValue::Text("abc".to_string())]);
    }

    #[test]
    fn test_select() {
        let query = Query::select("Players")
            .filter(Filter::eq("EosId", "abc"))
            .filter(Filter::ne("PlayerName", SqlValue::Null))
            .limit(1);
        let stmt = select(&query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM Players WHERE EosId = ? AND PlayerName <> ? LIMIT 1"
        );
        assert_eq!(stmt.params.len(), 2);

        let all = select(&Query::select("Players")).unwrap();
        assert_eq!(all.sql, "SELECT * FROM Players");
    }

    #[test]
    fn test_select_raw_is_passed_through() {
        let query = Query::raw("SELECT 1 AS one").filter(Filter::eq("a", 1)).limit(5);
        let stmt = select(&query).unwrap();
        assert_eq!(stmt.sql, "SELECT 1 AS one");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_list_columns() {
        let mysql = list_columns(Dialect::MySql, "Players").unwrap();
        assert!(mysql.sql.contains("information_schema.COLUMNS"));
        assert_eq!(mysql.params, vec![SqlValue::Text("Players".to_string())]);

        let sqlite = list_columns(Dialect::Sqlite, "Players").unwrap();
        assert_eq!(sqlite.sql, "SELECT name FROM pragma_table_info(?)");
    }

    #[test]
    fn test_escape_mysql() {
        assert_eq!(escape_mysql("O'Brien"), "O\\'Brien");
        assert_eq!(escape_mysql(r"C:\path"), r"C:\\path");
        assert_eq!(escape_mysql("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_mysql("a\nb\r\0"), "a\\nb\\r\\0");
        assert_eq!(escape_mysql("plain"), "plain");
    }

    #[test]
    fn test_escape_sqlite() {
        assert_eq!(escape_sqlite("O'Brien"), "O''Brien");
        assert_eq!(escape_sqlite("''"), "''''");
        assert_eq!(escape_sqlite(r#"back\slash "quote""#), r#"back\slash "quote""#);
    }

    #[test]
    fn test_sql_value_conversions() {
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".to_string()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(7i32), SqlValue::Int(7));
    }
}
