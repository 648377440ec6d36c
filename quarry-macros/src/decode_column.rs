use syn::{Field, Ident, LitStr, Result, Type};

pub(crate) struct ColumnMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) name: String,
    pub(crate) nullable: bool,
}

/// Column declared by `field`, or `None` when the field carries `#[skip]`.
pub(crate) fn decode_column(field: &Field) -> Result<Option<ColumnMetadata>> {
    if field.attrs.iter().any(|a| a.path().is_ident("skip")) {
        return Ok(None);
    }
    let Some(ident) = field.ident.clone() else {
        return Err(syn::Error::new_spanned(field, "Entity fields must be named"));
    };
    let mut name = ident.to_string();
    if let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("column_name")) {
        name = attr
            .parse_args::<LitStr>()
            .map_err(|e| {
                syn::Error::new(
                    e.span(),
                    "Error while parsing `column_name`, use it like #[column_name(\"name\")]",
                )
            })?
            .value();
    }
    Ok(Some(ColumnMetadata {
        ident,
        ty: field.ty.clone(),
        name,
        nullable: is_option(&field.ty),
    }))
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "Option")
}
