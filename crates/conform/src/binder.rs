//! Bind criteria onto a prepared statement and execute it.

use crate::criteria::{BindMode, Criteria, ParamKey};
use crate::driver::{Connection, Param, Statement, render_param_dump};
use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// Bind `criteria` onto `statement`, execute it, and hand the statement back for fetching.
///
/// Positional criteria (keys exactly `0..n`) bind driver indices `1..=n`. Named
/// criteria bind `Name(k)` as `:k` and `Index(i)` as driver index `i`, unshifted.
///
/// Any bind or execute failure is returned as [`OrmError::Execution`] carrying the
/// statement's parameter dump and a captured call stack.
pub fn bind_and_execute<S: Statement>(mut statement: S, criteria: &Criteria) -> OrmResult<S> {
    let mode = criteria.mode();
    tracing::debug!(
        target: "conform.sql",
        sql = statement.sql(),
        mode = ?mode,
        params = criteria.len(),
        "executing statement"
    );

    for (key, value) in criteria.iter() {
        let name;
        let param = match key {
            ParamKey::Index(i) if mode == BindMode::Positional => Param::Index(i + 1),
            ParamKey::Index(i) => Param::Index(*i),
            ParamKey::Name(n) => {
                name = if n.starts_with(':') {
                    n.clone()
                } else {
                    format!(":{n}")
                };
                Param::Name(&name)
            }
        };
        if let Err(e) = bind_value(&mut statement, param, value) {
            return Err(failure(&statement, format!("bind {param}: {e}")));
        }
    }

    match statement.execute() {
        Ok(affected) => {
            tracing::trace!(target: "conform.sql", affected, "statement executed");
            Ok(statement)
        }
        Err(e) => Err(failure(&statement, driver_message(&e))),
    }
}

fn bind_value<S: Statement>(statement: &mut S, param: Param<'_>, value: &Value) -> OrmResult<()> {
    match value {
        Value::Text(s) => statement.bind_text(param, s),
        Value::Integer(i) => statement.bind_integer(param, *i),
        Value::Null => statement.bind_null(param),
    }
}

/// Prepare `sql` on `conn`.
///
/// Driver rejections (unknown table or column, syntax errors) are reported as
/// [`OrmError::Execution`] with an empty parameter dump, the same as a failed execute.
pub fn prepare<'c, C: Connection>(conn: &'c C, sql: &str) -> OrmResult<C::Statement<'c>> {
    conn.prepare(sql).map_err(|e| match e {
        OrmError::Sqlite(_) | OrmError::Postgres(_) => {
            report(sql, render_param_dump(sql, &[]), driver_message(&e))
        }
        other => other,
    })
}

/// Server-side errors carry their detail in the `DbError`, not in the top-level message.
fn driver_message(e: &OrmError) -> String {
    match e {
        OrmError::Postgres(pg) => pg
            .as_db_error()
            .map_or_else(|| pg.to_string(), ToString::to_string),
        other => other.to_string(),
    }
}

fn failure<S: Statement>(statement: &S, message: String) -> OrmError {
    report(statement.sql(), statement.dump_params(), message)
}

fn report(sql: &str, params: String, message: String) -> OrmError {
    tracing::error!(
        target: "conform.sql",
        sql,
        params = %params,
        error = %message,
        "statement failed"
    );
    OrmError::execution(sql, params, message)
}
