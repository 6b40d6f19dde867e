//! Row ↔ entity mapping.

use crate::entity::{Entity, Field};
use crate::error::{OrmError, OrmResult};
use crate::ident::sanitize;
use crate::row::Row;
use crate::value::Value;
use heck::ToLowerCamelCase;

/// Extract `(column, value)` pairs in declaration order.
///
/// Column names are sanitized. The id column reports [`Value::Null`] while the
/// entity is transient, so the `0` sentinel is never written.
pub fn extract_fields<E: Entity>(entity: &E) -> Vec<(String, Value)> {
    let transient = entity.is_transient();
    E::fields()
        .iter()
        .map(|field| {
            let value = if transient && field.column == E::ID_COLUMN {
                Value::Null
            } else {
                (field.get)(entity)
            };
            (sanitize(field.column), value)
        })
        .collect()
}

/// Build a new entity from a row.
///
/// Columns without a matching field are skipped; conversion failures are a
/// [`OrmError::Decode`] for that column.
pub fn hydrate<E: Entity>(row: &Row) -> OrmResult<E> {
    let mut entity = E::default();
    for (column, value) in row.iter() {
        let Some(field) = find_field::<E>(column) else {
            tracing::trace!(
                target: "conform.sql",
                table = E::table_name(),
                column,
                "no field for column, skipping"
            );
            continue;
        };
        (field.set)(&mut entity, value.clone())
            .map_err(|message| OrmError::decode(column, message))?;
    }
    Ok(entity)
}

/// Exact (or sanitized) column match first, then a lowerCamelCase comparison
/// (`first_name` ~ `firstName`).
fn find_field<E: Entity>(column: &str) -> Option<&'static Field<E>> {
    let fields = E::fields();
    let exact = fields
        .iter()
        .find(|f| f.column == column || sanitize(f.column) == column);
    exact.or_else(|| {
        let wanted = column.to_lower_camel_case();
        fields
            .iter()
            .find(|f| f.column.to_lower_camel_case() == wanted)
    })
}
