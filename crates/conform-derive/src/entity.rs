//! Entity derive macro implementation

use crate::attrs::{parse_entity_attrs, parse_field_attrs};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Result};

struct Persisted<'a> {
    ident: &'a syn::Ident,
    column: String,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let entity_attr = parse_entity_attrs(&input.attrs)?;
    let table = entity_attr
        .table
        .unwrap_or_else(|| name.to_string().to_lowercase());

    let mut persisted = Vec::new();
    let mut marked_id = None;
    let mut named_id = None;
    for field in fields {
        let ident = field.ident.as_ref().expect("named fields have identifiers");
        let attr = parse_field_attrs(&field.attrs)?;
        if attr.skip {
            if attr.is_id {
                return Err(syn::Error::new_spanned(field, "the id field cannot be skipped"));
            }
            continue;
        }
        let column = attr.column.unwrap_or_else(|| ident.to_string());
        if attr.is_id {
            if marked_id.is_some() {
                return Err(syn::Error::new_spanned(field, "only one field can be #[orm(id)]"));
            }
            marked_id = Some(persisted.len());
        } else if ident == "id" {
            named_id = Some(persisted.len());
        }
        persisted.push(Persisted { ident, column });
    }

    let Some(id_index) = marked_id.or(named_id) else {
        return Err(syn::Error::new_spanned(
            &input,
            "Entity requires an `id: i64` field or a field marked #[orm(id)]",
        ));
    };
    let id_ident = persisted[id_index].ident;
    let id_column = &persisted[id_index].column;

    let mut accessors = Vec::new();
    let mut entries = Vec::new();
    for (i, field) in persisted.iter().enumerate() {
        let ident = field.ident;
        let column = &field.column;
        let getter = format_ident!("__conform_get_{}", i, span = Span::call_site());
        let setter = format_ident!("__conform_set_{}", i, span = Span::call_site());
        accessors.push(quote! {
            fn #getter(entity: &#name) -> ::conform::Value {
                ::conform::ToValue::to_value(&entity.#ident)
            }
            fn #setter(
                entity: &mut #name,
                value: ::conform::Value,
            ) -> ::core::result::Result<(), ::std::string::String> {
                entity.#ident = ::conform::FromValue::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        });
        entries.push(quote! {
            ::conform::Field { column: #column, get: #getter, set: #setter }
        });
    }

    Ok(quote! {
        impl ::conform::Entity for #name {
            const ID_COLUMN: &'static str = #id_column;

            fn table_name() -> &'static str {
                #table
            }

            fn fields() -> &'static [::conform::Field<Self>] {
                #(#accessors)*
                static FIELDS: &[::conform::Field<#name>] = &[#(#entries),*];
                FIELDS
            }

            fn id(&self) -> i64 {
                self.#id_ident
            }

            fn set_id(&mut self, id: i64) {
                self.#id_ident = id;
            }
        }
    })
}
