//! # conform
//!
//! A minimal convention-based object-relational mapper for Rust.
//!
//! ## Features
//!
//! - **Convention over configuration**: table = lowercased type name, column = field name
//! - **Explicit descriptor tables**: `#[derive(Entity)]` registers `(column, getter, setter)`
//!   once per type
//! - **Two binding modes**: positional (`?`) or named (`:name`), inferred from the criteria's keys
//! - **Insert-or-update**: `persist` inserts when the id is `0` and updates otherwise
//! - **Synchronous**: every call blocks inline; no runtime to manage
//! - **Errors as values**: bind/execute failures carry the parameter dump and a call stack
//!
//! ## Example
//!
//! ```ignore
//! use conform::{Criteria, Entity, Orm, SqliteConnection};
//!
//! #[derive(Debug, Default, Entity)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let orm = Orm::new(SqliteConnection::open_in_memory()?);
//!
//! let mut bob = User { id: 0, name: "Bob".into() };
//! orm.save(&mut bob)?;
//!
//! let found: Option<User> = orm.get(bob.id)?;
//!
//! let stmt = orm.prepare("SELECT * FROM user WHERE name = :name")?;
//! let rows = orm.find_all(stmt, &Criteria::new().named("name", "Bob"))?;
//!
//! orm.delete(&bob)?;
//! ```

pub mod binder;
pub mod config;
pub mod criteria;
pub mod driver;
pub mod entity;
pub mod error;
pub mod ident;
pub mod mapper;
pub mod orm;
pub mod prelude;
pub mod row;
pub mod value;

pub use binder::bind_and_execute;
pub use config::ConnectionConfig;
pub use criteria::{BindMode, Criteria, ParamKey};
pub use driver::{Connection, Param, PgConnection, SqliteConnection, Statement};
pub use entity::{Entity, Field};
pub use error::{OrmError, OrmResult};
pub use ident::sanitize;
pub use mapper::{extract_fields, hydrate};
pub use orm::Orm;
pub use row::Row;
pub use value::{FromValue, ToValue, Value};

#[cfg(feature = "derive")]
pub use conform_derive::Entity;
