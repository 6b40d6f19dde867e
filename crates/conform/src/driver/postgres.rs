//! PostgreSQL backend over `tokio-postgres`.
//!
//! The connection owns a current-thread tokio runtime and blocks on every call,
//! so the mapper stays synchronous. The connection task is spawned on that
//! runtime and only makes progress while a call is blocking on it.

use super::placeholders::{self, Rewritten};
use super::{Connection, Param, Statement, record_binding, render_param_dump};
use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use std::collections::VecDeque;
use std::error::Error;
use tokio::runtime::Runtime;
use tokio_postgres::NoTls;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A blocking PostgreSQL connection.
#[derive(Debug)]
pub struct PgConnection {
    runtime: Runtime,
    client: tokio_postgres::Client,
}

impl PgConnection {
    /// Connect using the given configuration.
    ///
    /// Any failure (runtime, config parse, network, auth) is an [`OrmError::Connection`].
    pub fn connect(config: &ConnectionConfig) -> OrmResult<Self> {
        let pg_config: tokio_postgres::Config = config
            .connection_string()
            .parse()
            .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OrmError::Connection(e.to_string()))?;

        let (client, connection) = runtime
            .block_on(pg_config.connect(NoTls))
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "conform.sql", error = %e, "postgres connection error");
            }
        });

        tracing::debug!(
            target: "conform.sql",
            host = %config.host,
            dbname = %config.dbname,
            "connected to postgres"
        );
        Ok(Self { runtime, client })
    }

    /// Run one or more semicolon-separated statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }
}

impl Connection for PgConnection {
    type Statement<'c> = PgStatement<'c>;

    fn prepare<'c>(&'c self, sql: &str) -> OrmResult<PgStatement<'c>> {
        let rewritten = placeholders::rewrite(sql)?;
        let statement = self
            .runtime
            .block_on(self.client.prepare(&rewritten.sql))?;
        let values = vec![Value::Null; rewritten.slots.len()];
        Ok(PgStatement {
            conn: self,
            sql: sql.to_string(),
            rewritten,
            statement,
            values,
            bound: Vec::new(),
            buffered: VecDeque::new(),
            affected: 0,
        })
    }

    fn last_insert_id(&self) -> OrmResult<i64> {
        let row = self
            .runtime
            .block_on(self.client.query_one("SELECT lastval()", &[]))?;
        Ok(row.try_get::<_, i64>(0)?)
    }
}

/// Prepared statement on a [`PgConnection`].
#[derive(Debug)]
pub struct PgStatement<'c> {
    conn: &'c PgConnection,
    sql: String,
    rewritten: Rewritten,
    statement: tokio_postgres::Statement,
    values: Vec<Value>,
    bound: Vec<(String, Value)>,
    buffered: VecDeque<Row>,
    affected: u64,
}

impl PgStatement<'_> {
    fn bind(&mut self, param: Param<'_>, value: Value) -> OrmResult<()> {
        let slot = match param {
            Param::Index(i) if (1..=self.values.len()).contains(&i) => i - 1,
            Param::Index(i) => {
                return Err(OrmError::validation(format!(
                    "parameter ?{i} out of range (statement has {})",
                    self.values.len()
                )));
            }
            Param::Name(name) => self
                .rewritten
                .slot_for(name)
                .ok_or_else(|| OrmError::validation(format!("unknown parameter '{name}'")))?,
        };
        record_binding(&mut self.bound, param, value.clone());
        self.values[slot] = value;
        Ok(())
    }
}

impl Statement for PgStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn bind_text(&mut self, param: Param<'_>, value: &str) -> OrmResult<()> {
        self.bind(param, Value::Text(value.to_string()))
    }

    fn bind_integer(&mut self, param: Param<'_>, value: i64) -> OrmResult<()> {
        self.bind(param, Value::Integer(value))
    }

    fn bind_null(&mut self, param: Param<'_>) -> OrmResult<()> {
        self.bind(param, Value::Null)
    }

    fn execute(&mut self) -> OrmResult<u64> {
        self.buffered.clear();
        self.affected = 0;
        let params: Vec<&(dyn ToSql + Sync)> =
            self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let conn = self.conn;

        if self.statement.columns().is_empty() {
            self.affected = conn
                .runtime
                .block_on(conn.client.execute(&self.statement, &params))?;
            return Ok(self.affected);
        }

        let rows = conn
            .runtime
            .block_on(conn.client.query(&self.statement, &params))?;
        for row in &rows {
            self.buffered.push_back(row_from_pg(row)?);
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

fn is_text_type(ty: &Type) -> bool {
    *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
        || *ty == Type::UNKNOWN
}

fn row_from_pg(row: &tokio_postgres::Row) -> OrmResult<Row> {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let ty = column.type_();
        let decode = |e: tokio_postgres::Error| OrmError::decode(name, e.to_string());
        let value: Value = if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(i).map_err(decode)?.map(i64::from).into()
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(i).map_err(decode)?.map(i64::from).into()
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(i).map_err(decode)?.into()
        } else if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(i).map_err(decode)?.map(i64::from).into()
        } else if is_text_type(ty) {
            row.try_get::<_, Option<String>>(i).map_err(decode)?.into()
        } else {
            return Err(OrmError::decode(
                name,
                format!("unsupported column type '{ty}'; only text and integer columns map"),
            ));
        };
        out.push(name, value);
    }
    Ok(out)
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        let integer = match self {
            Value::Null => return Ok(IsNull::Yes),
            Value::Integer(i) => *i,
            Value::Text(s) if is_text_type(ty) => return s.as_str().to_sql(ty, out),
            Value::Text(s) => s.trim().parse::<i64>()?,
        };
        if *ty == Type::INT2 {
            i16::try_from(integer)?.to_sql(ty, out)
        } else if *ty == Type::INT4 {
            i32::try_from(integer)?.to_sql(ty, out)
        } else if *ty == Type::INT8 {
            integer.to_sql(ty, out)
        } else {
            integer.to_string().as_str().to_sql(ty, out)
        }
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 || is_text_type(ty)
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_accepts_only_text_and_integer_types() {
        assert!(<Value as ToSql>::accepts(&Type::INT4));
        assert!(<Value as ToSql>::accepts(&Type::VARCHAR));
        assert!(!<Value as ToSql>::accepts(&Type::FLOAT8));
        assert!(!<Value as ToSql>::accepts(&Type::JSONB));
    }

    #[test]
    fn integer_narrows_to_column_width() {
        let mut buf = BytesMut::new();
        let is_null = Value::Integer(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&buf[..], &7_i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Integer(i64::from(i32::MAX) + 1).to_sql(&Type::INT4, &mut buf).is_err());
    }

    #[test]
    fn numeric_text_binds_into_integer_column() {
        let mut buf = BytesMut::new();
        Value::Text("42".into()).to_sql(&Type::INT8, &mut buf).unwrap();
        assert_eq!(&buf[..], &42_i64.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::Text("Bob".into()).to_sql(&Type::INT8, &mut buf).is_err());
    }

    #[test]
    fn null_binds_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }
}
