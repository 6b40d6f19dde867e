//! Driver seam: the prepare/bind/execute/fetch primitives the mapper runs on.
//!
//! Two backends ship with the crate:
//! - [`SqliteConnection`] over `rusqlite`, which understands `?` and `:name` natively.
//! - [`PgConnection`] over `tokio-postgres`, which rewrites placeholders to `$n`.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;
use std::fmt::Write as _;

pub mod placeholders;
pub mod postgres;
pub mod sqlite;

pub use postgres::PgConnection;
pub use sqlite::SqliteConnection;

/// Driver-level parameter reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param<'a> {
    /// 1-based position.
    Index(usize),
    /// Parameter name including the leading `:`.
    Name(&'a str),
}

impl std::fmt::Display for Param<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(i) => write!(f, "?{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

/// A single database connection.
///
/// Connections are used from one thread of control at a time; statements borrow
/// the connection that prepared them.
pub trait Connection {
    type Statement<'c>: Statement
    where
        Self: 'c;

    /// Prepare a statement on this connection.
    fn prepare<'c>(&'c self, sql: &str) -> OrmResult<Self::Statement<'c>>;

    /// Id generated by the most recent successful INSERT on this connection.
    fn last_insert_id(&self) -> OrmResult<i64>;
}

/// A prepared statement handle.
pub trait Statement {
    /// SQL text as passed to [`Connection::prepare`].
    fn sql(&self) -> &str;

    fn bind_text(&mut self, param: Param<'_>, value: &str) -> OrmResult<()>;

    fn bind_integer(&mut self, param: Param<'_>, value: i64) -> OrmResult<()>;

    fn bind_null(&mut self, param: Param<'_>) -> OrmResult<()>;

    /// Execute with the current bindings and return the number of affected rows.
    ///
    /// Row-returning statements buffer their result set for [`Statement::fetch`].
    fn execute(&mut self) -> OrmResult<u64>;

    /// Rows affected by the last [`Statement::execute`]; `0` for row-returning statements.
    fn rows_affected(&self) -> u64;

    /// Next buffered row, if any.
    fn fetch(&mut self) -> OrmResult<Option<Row>>;

    /// All remaining buffered rows.
    fn fetch_all(&mut self) -> OrmResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Human-readable dump of the SQL and the bound parameters.
    fn dump_params(&self) -> String;
}

/// Shared rendering for [`Statement::dump_params`].
pub(crate) fn render_param_dump(sql: &str, bound: &[(String, Value)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SQL: [{}] {}", sql.len(), sql);
    let _ = write!(out, "Params: {}", bound.len());
    for (param, value) in bound {
        let _ = write!(out, "\n  {param} = {value}");
    }
    out
}

/// Record a binding for the parameter dump, replacing an earlier one.
pub(crate) fn record_binding(bound: &mut Vec<(String, Value)>, param: Param<'_>, value: Value) {
    let key = param.to_string();
    match bound.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => bound.push((key, value)),
    }
}
