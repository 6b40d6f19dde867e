//! Common imports.
//!
//! ```ignore
//! use conform::prelude::*;
//! ```

pub use crate::{
    Connection, Criteria, Entity, FromValue, Orm, OrmError, OrmResult, Row, SqliteConnection,
    Statement, ToValue, Value,
};
