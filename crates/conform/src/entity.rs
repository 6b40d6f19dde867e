//! Entity capability contract.

use crate::value::Value;

/// One persisted field: its column name plus accessor functions.
///
/// Descriptor tables are normally generated by `#[derive(Entity)]`.
pub struct Field<E> {
    pub column: &'static str,
    pub get: fn(&E) -> Value,
    pub set: fn(&mut E, Value) -> Result<(), String>,
}

impl<E> std::fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field").field("column", &self.column).finish()
    }
}

/// A domain type mapped 1:1 to a table.
///
/// An id of `0` marks a transient entity (no row yet). Any other id means a row
/// with that id exists.
///
/// # Example
///
/// ```ignore
/// use conform::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// assert_eq!(User::table_name(), "user");
/// ```
pub trait Entity: Default + 'static {
    /// Column holding the id.
    const ID_COLUMN: &'static str = "id";

    /// Storage table name.
    fn table_name() -> &'static str;

    /// Persisted fields in declaration order, including the id.
    fn fields() -> &'static [Field<Self>];

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Whether the entity has no row yet.
    fn is_transient(&self) -> bool {
        self.id() == 0
    }
}
