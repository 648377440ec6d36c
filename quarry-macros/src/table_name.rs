use syn::{ItemStruct, LitStr, Result};

/// Value of `#[table("...")]`, if present.
pub(crate) fn table_name(item: &ItemStruct) -> Result<Option<String>> {
    literal_attribute(item, "table")
}

/// Value of `#[primary_key("...")]`, if present.
pub(crate) fn table_primary_key(item: &ItemStruct) -> Result<Option<String>> {
    literal_attribute(item, "primary_key")
}

fn literal_attribute(item: &ItemStruct, name: &str) -> Result<Option<String>> {
    let Some(attr) = item.attrs.iter().find(|a| a.path().is_ident(name)) else {
        return Ok(None);
    };
    let value = attr.parse_args::<LitStr>().map_err(|e| {
        syn::Error::new(
            e.span(),
            format!("Error while parsing `{name}`, use it like #[{name}(\"value\")]"),
        )
    })?;
    Ok(Some(value.value()))
}
