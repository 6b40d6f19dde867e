//! Attribute parsing for the Entity derive macro.
//!
//! Handles struct-level and field-level `#[orm(...)]` attributes.

use syn::{Attribute, LitStr, Result};

/// Struct-level options.
#[derive(Default)]
pub(crate) struct EntityAttr {
    pub table: Option<String>,
}

/// Field-level options.
#[derive(Default)]
pub(crate) struct FieldAttr {
    pub is_id: bool,
    pub skip: bool,
    pub column: Option<String>,
}

pub(crate) fn parse_entity_attrs(attrs: &[Attribute]) -> Result<EntityAttr> {
    let mut out = EntityAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                out.table = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported entity attribute; expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(out)
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                out.is_id = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                out.column = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported field attribute; expected `id`, `skip` or `column = \"...\"`",
                ))
            }
        })?;
    }
    Ok(out)
}
