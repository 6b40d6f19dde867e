//! The persistence facade.

use crate::binder::{bind_and_execute, prepare};
use crate::config::ConnectionConfig;
use crate::criteria::Criteria;
use crate::driver::{Connection, PgConnection, Statement};
use crate::entity::Entity;
use crate::error::OrmResult;
use crate::mapper::{extract_fields, hydrate};
use crate::row::Row;
use crate::value::Value;

/// Convention-based CRUD over a single connection.
///
/// Every call is synchronous and self-contained; the only state carried between
/// calls is the connection itself.
///
/// # Example
///
/// ```ignore
/// use conform::{Entity, Orm, SqliteConnection};
///
/// #[derive(Debug, Default, Entity)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// let orm = Orm::new(SqliteConnection::open_in_memory()?);
/// let id = orm.persist(&User { id: 0, name: "Bob".into() })?;
/// let user: Option<User> = orm.get(id)?;
/// ```
pub struct Orm<C: Connection> {
    conn: C,
}

impl Orm<PgConnection> {
    /// Open a PostgreSQL connection from `config`.
    pub fn connect(config: &ConnectionConfig) -> OrmResult<Self> {
        PgConnection::connect(config).map(Self::new)
    }
}

impl<C: Connection> Orm<C> {
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Prepare a hand-written statement for [`Orm::find_one`] / [`Orm::find_all`].
    ///
    /// A statement the driver rejects is an [`OrmError::Execution`](crate::OrmError::Execution).
    pub fn prepare(&self, sql: &str) -> OrmResult<C::Statement<'_>> {
        prepare(&self.conn, sql)
    }

    /// Fetch the entity with the given id, or `None` if no row matches.
    pub fn get<E: Entity>(&self, id: i64) -> OrmResult<Option<E>> {
        let sql = format!("SELECT * FROM {} WHERE {} = ?", E::table_name(), E::ID_COLUMN);
        let statement = prepare(&self.conn, &sql)?;
        let mut statement = bind_and_execute(statement, &Criteria::positional([id]))?;
        statement.fetch()?.map(|row| hydrate(&row)).transpose()
    }

    /// Bind and execute a prepared statement, then fetch its first row.
    pub fn find_one<S: Statement>(
        &self,
        statement: S,
        criteria: &Criteria,
    ) -> OrmResult<Option<Row>> {
        let mut statement = bind_and_execute(statement, criteria)?;
        statement.fetch()
    }

    /// Bind and execute a prepared statement, then fetch all rows.
    pub fn find_all<S: Statement>(
        &self,
        statement: S,
        criteria: &Criteria,
    ) -> OrmResult<Vec<Row>> {
        let mut statement = bind_and_execute(statement, criteria)?;
        statement.fetch_all()
    }

    /// [`Orm::find_one`], hydrating the row into `E`.
    pub fn find_one_as<E: Entity, S: Statement>(
        &self,
        statement: S,
        criteria: &Criteria,
    ) -> OrmResult<Option<E>> {
        self.find_one(statement, criteria)?
            .map(|row| hydrate(&row))
            .transpose()
    }

    /// [`Orm::find_all`], hydrating every row into `E`.
    pub fn find_all_as<E: Entity, S: Statement>(
        &self,
        statement: S,
        criteria: &Criteria,
    ) -> OrmResult<Vec<E>> {
        self.find_all(statement, criteria)?
            .iter()
            .map(hydrate)
            .collect()
    }

    /// Prepare `sql` and return all rows it produces.
    pub fn query(&self, sql: &str, criteria: &Criteria) -> OrmResult<Vec<Row>> {
        let statement = prepare(&self.conn, sql)?;
        self.find_all(statement, criteria)
    }

    /// Insert a transient entity or update a persisted one; returns its id.
    ///
    /// Inserts write only non-null fields, so column defaults apply to the rest.
    /// Updates write every field, the id included, and target the id as a literal.
    pub fn persist<E: Entity>(&self, entity: &E) -> OrmResult<i64> {
        if entity.is_transient() {
            self.insert(entity)
        } else {
            self.update(entity)
        }
    }

    /// [`Orm::persist`], writing a generated id back into a transient entity.
    pub fn save<E: Entity>(&self, entity: &mut E) -> OrmResult<i64> {
        let id = self.persist(entity)?;
        if entity.is_transient() {
            entity.set_id(id);
        }
        Ok(id)
    }

    /// Delete the entity's row and return the number of affected rows.
    ///
    /// The entity's in-memory id is left as is.
    pub fn delete<E: Entity>(&self, entity: &E) -> OrmResult<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", E::table_name(), E::ID_COLUMN);
        let statement = prepare(&self.conn, &sql)?;
        let statement = bind_and_execute(statement, &Criteria::positional([entity.id()]))?;
        let affected = statement.rows_affected();
        tracing::debug!(
            target: "conform.sql",
            table = E::table_name(),
            id = entity.id(),
            affected,
            "deleted"
        );
        Ok(affected)
    }

    fn insert<E: Entity>(&self, entity: &E) -> OrmResult<i64> {
        let (columns, values): (Vec<String>, Vec<Value>) = extract_fields(entity)
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .unzip();

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", E::table_name())
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                E::table_name(),
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };

        let statement = prepare(&self.conn, &sql)?;
        bind_and_execute(statement, &Criteria::positional(values))?;
        let id = self.conn.last_insert_id()?;
        tracing::debug!(target: "conform.sql", table = E::table_name(), id, "inserted");
        Ok(id)
    }

    fn update<E: Entity>(&self, entity: &E) -> OrmResult<i64> {
        let id = entity.id();
        let (columns, values): (Vec<String>, Vec<Value>) =
            extract_fields(entity).into_iter().unzip();
        let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = ?")).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {id}",
            E::table_name(),
            assignments.join(", "),
            E::ID_COLUMN
        );

        let statement = prepare(&self.conn, &sql)?;
        let statement = bind_and_execute(statement, &Criteria::positional(values))?;
        if statement.rows_affected() == 0 {
            tracing::warn!(
                target: "conform.sql",
                table = E::table_name(),
                id,
                "update matched no rows"
            );
        } else {
            tracing::debug!(target: "conform.sql", table = E::table_name(), id, "updated");
        }
        Ok(id)
    }
}
