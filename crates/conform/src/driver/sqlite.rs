//! SQLite backend over `rusqlite`.

use super::{Connection, Param, Statement, record_binding, render_param_dump};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use rusqlite::types::{Null, ValueRef};
use std::collections::VecDeque;
use std::path::Path;

/// A single SQLite connection.
///
/// SQLite accepts both `?` and `:name` placeholders, so SQL is passed through as is.
///
/// # Example
///
/// ```
/// use conform::{Orm, SqliteConnection};
///
/// let conn = SqliteConnection::open_in_memory()?;
/// conn.execute_batch("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)")?;
/// let orm = Orm::new(conn);
/// # Ok::<(), conform::OrmError>(())
/// ```
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| OrmError::Connection(format!("{}: {e}", path.display())))?;
        tracing::debug!(target: "conform.sql", path = %path.display(), "opened sqlite database");
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Wrap an already configured `rusqlite` connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Run one or more semicolon-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl Connection for SqliteConnection {
    type Statement<'c> = SqliteStatement<'c>;

    fn prepare<'c>(&'c self, sql: &str) -> OrmResult<SqliteStatement<'c>> {
        let inner = self.conn.prepare(sql)?;
        Ok(SqliteStatement {
            inner,
            sql: sql.to_string(),
            bound: Vec::new(),
            buffered: VecDeque::new(),
            affected: 0,
        })
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        Ok(self.conn.last_insert_rowid())
    }
}

/// Prepared statement on a [`SqliteConnection`].
#[derive(Debug)]
pub struct SqliteStatement<'c> {
    inner: rusqlite::Statement<'c>,
    sql: String,
    bound: Vec<(String, Value)>,
    buffered: VecDeque<Row>,
    affected: u64,
}

impl SqliteStatement<'_> {
    fn resolve(&self, param: Param<'_>) -> OrmResult<usize> {
        let index = match param {
            Param::Index(i) => i,
            Param::Name(name) => self
                .inner
                .parameter_index(name)?
                .ok_or_else(|| OrmError::validation(format!("unknown parameter '{name}'")))?,
        };
        if index == 0 || index > self.inner.parameter_count() {
            return Err(OrmError::validation(format!(
                "parameter {param} out of range (statement has {})",
                self.inner.parameter_count()
            )));
        }
        Ok(index)
    }
}

impl Statement for SqliteStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn bind_text(&mut self, param: Param<'_>, value: &str) -> OrmResult<()> {
        let index = self.resolve(param)?;
        self.inner.raw_bind_parameter(index, value)?;
        record_binding(&mut self.bound, param, Value::Text(value.to_string()));
        Ok(())
    }

    fn bind_integer(&mut self, param: Param<'_>, value: i64) -> OrmResult<()> {
        let index = self.resolve(param)?;
        self.inner.raw_bind_parameter(index, value)?;
        record_binding(&mut self.bound, param, Value::Integer(value));
        Ok(())
    }

    fn bind_null(&mut self, param: Param<'_>) -> OrmResult<()> {
        let index = self.resolve(param)?;
        self.inner.raw_bind_parameter(index, Null)?;
        record_binding(&mut self.bound, param, Value::Null);
        Ok(())
    }

    fn execute(&mut self) -> OrmResult<u64> {
        self.buffered.clear();
        self.affected = 0;
        if self.inner.column_count() == 0 {
            self.affected = self.inner.raw_execute()? as u64;
            return Ok(self.affected);
        }

        let names: Vec<String> = self
            .inner
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = self.inner.raw_query();
        while let Some(row) = rows.next()? {
            let mut out = Row::new();
            for (i, name) in names.iter().enumerate() {
                out.push(name.clone(), value_from_ref(row.get_ref(i)?));
            }
            self.buffered.push_back(out);
        }
        Ok(0)
    }

    fn rows_affected(&self) -> u64 {
        self.affected
    }

    fn fetch(&mut self) -> OrmResult<Option<Row>> {
        Ok(self.buffered.pop_front())
    }

    fn dump_params(&self) -> String {
        render_param_dump(&self.sql, &self.bound)
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Text(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE item (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT, qty INTEGER);
             INSERT INTO item (label, qty) VALUES ('a', 1), ('b', 2);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn buffers_rows_for_select() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT id, label, qty FROM item WHERE qty >= ?").unwrap();
        stmt.bind_integer(Param::Index(1), 1).unwrap();
        stmt.execute().unwrap();

        let first = stmt.fetch().unwrap().unwrap();
        assert_eq!(first.get("label"), Some(&Value::Text("a".into())));
        assert_eq!(first.get("qty"), Some(&Value::Integer(1)));
        assert_eq!(stmt.fetch_all().unwrap().len(), 1);
        assert_eq!(stmt.fetch().unwrap(), None);
    }

    #[test]
    fn binds_named_parameters() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT label FROM item WHERE label = :label").unwrap();
        stmt.bind_text(Param::Name(":label"), "b").unwrap();
        stmt.execute().unwrap();
        assert_eq!(stmt.fetch_all().unwrap().len(), 1);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT label FROM item WHERE label = :label").unwrap();
        let err = stmt.bind_text(Param::Name(":nope"), "b").unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let conn = conn();
        let mut stmt = conn.prepare("SELECT label FROM item WHERE id = ?").unwrap();
        assert!(stmt.bind_integer(Param::Index(0), 1).is_err());
        assert!(stmt.bind_integer(Param::Index(2), 1).is_err());
    }

    #[test]
    fn write_reports_affected_rows_and_last_id() {
        let conn = conn();
        let mut stmt = conn.prepare("INSERT INTO item (label) VALUES (?)").unwrap();
        stmt.bind_text(Param::Index(1), "c").unwrap();
        assert_eq!(stmt.execute().unwrap(), 1);
        assert_eq!(conn.last_insert_id().unwrap(), 3);

        let mut stmt = conn.prepare("UPDATE item SET qty = ?").unwrap();
        stmt.bind_null(Param::Index(1)).unwrap();
        assert_eq!(stmt.execute().unwrap(), 3);
        assert_eq!(stmt.rows_affected(), 3);
        assert!(stmt.dump_params().contains("?1 = NULL"));
    }
}
