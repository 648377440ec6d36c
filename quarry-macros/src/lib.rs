mod decode_column;
mod table_name;

use decode_column::decode_column;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Fields, ItemStruct, parse_macro_input};
use table_name::{table_name, table_primary_key};

/// Implements `quarry::Entity` for a struct with named fields.
///
/// - `#[table("name")]` on the struct sets the table, which defaults to the struct name.
/// - `#[primary_key("column")]` on the struct names the primary key column.
/// - `#[column_name("name")]` on a field renames its column.
/// - `#[skip]` on a field leaves it out of every statement and mapping.
///
/// Fields must implement `quarry::AsValue` and `Clone`; `Option<T>` fields are nullable.
#[proc_macro_derive(Entity, attributes(table, primary_key, column_name, skip))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemStruct);
    entity(&item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn entity(item: &ItemStruct) -> syn::Result<TokenStream2> {
    let name = &item.ident;
    let type_name = name.to_string();
    let Fields::Named(fields) = &item.fields else {
        return Err(syn::Error::new_spanned(
            item,
            "Entity can only be derived for structs with named fields",
        ));
    };
    let columns = fields
        .named
        .iter()
        .map(decode_column)
        .filter_map(Result::transpose)
        .collect::<syn::Result<Vec<_>>>()?;
    let table = table_name(item)?.map(|v| quote!(.table(#v)));
    let primary_key = table_primary_key(item)?;
    if let Some(primary_key) = &primary_key
        && !columns.iter().any(|c| c.name == *primary_key)
    {
        return Err(syn::Error::new_spanned(
            name,
            format!("Primary key `{primary_key}` is not a column of `{type_name}`"),
        ));
    }
    let primary_key = primary_key.map(|v| quote!(.primary_key(#v)));
    let declarations = columns.iter().map(|c| {
        let column = &c.name;
        let ty = &c.ty;
        let nullable = c.nullable;
        quote! {
            .column(
                ::quarry::ColumnDef::new(#column, <#ty as ::quarry::AsValue>::as_empty_value())
                    .nullable(#nullable)
            )
        }
    });
    let getters = columns.iter().map(|c| {
        let column = &c.name;
        let ident = &c.ident;
        quote! {
            #column => ::std::option::Option::Some(::quarry::AsValue::as_value(
                ::std::clone::Clone::clone(&self.#ident),
            )),
        }
    });
    let setters = columns.iter().map(|c| {
        let column = &c.name;
        let ident = &c.ident;
        let ty = &c.ty;
        quote! {
            #column => {
                self.#ident = <#ty as ::quarry::AsValue>::try_from_value(value)?;
            }
        }
    });
    let (impl_generics, ty_generics, where_clause) = item.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::quarry::Entity for #name #ty_generics #where_clause {
            fn describe() -> ::quarry::EntityDescriptor {
                ::quarry::EntityDescriptor::new(#type_name)
                    #table
                    #primary_key
                    #(#declarations)*
            }

            fn get_value(&self, column: &str) -> ::std::option::Option<::quarry::Value> {
                match column {
                    #(#getters)*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_value(&mut self, column: &str, value: ::quarry::Value) -> ::quarry::Result<()> {
                match column {
                    #(#setters)*
                    _ => {}
                }
                ::std::result::Result::Ok(())
            }
        }
    })
}
