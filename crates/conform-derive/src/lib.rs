//! Derive macros for conform
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod entity;

/// Derive the `Entity` descriptor table for a struct.
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
///     #[orm(column = "email_address")]
///     email: Option<String>,
///     #[orm(skip)]
///     cached_score: u32,
/// }
/// ```
///
/// # Generated
///
/// - `table_name()` - the lowercased type name unless overridden
/// - `fields()` - a static `(column, getter, setter)` table in declaration order
/// - `id()` / `set_id()` - accessors for the id field
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Specify table name
/// - `#[orm(id)]` - Mark the id field (defaults to the field named `id`; must be `i64`)
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(skip)]` - Do not persist the field (it is left at `Default` on hydration)
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
