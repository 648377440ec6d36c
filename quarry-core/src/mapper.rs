use crate::{Context, DataError, Entity, EntityMetadata, Result, RowLabeled};
use std::mem;

/// Build a record from a result row.
///
/// Starts from `E::default()` and assigns every declared column found in the
/// row. Numeric columns are coerced to their declared type first. A declared
/// column missing from the row keeps its default, or fails with
/// [`DataError::MissingField`] when `strict`. Extra row columns are ignored.
pub fn map_row<E: Entity>(
    mut row: RowLabeled,
    metadata: &EntityMetadata,
    strict: bool,
) -> Result<E> {
    let mut entity = E::default();
    for column in metadata.columns() {
        let Some(index) = row.position(column.name()) else {
            if strict {
                let error = crate::Error::new(DataError::MissingField {
                    entity: metadata.type_name().to_string(),
                    field: column.name().to_string(),
                });
                log::error!("{:#}", error);
                return Err(error);
            }
            continue;
        };
        let value = mem::take(&mut row.values[index]);
        let value = if column.value.is_numeric() {
            value.coerce_to(&column.value)
        } else {
            Ok(value)
        };
        let result = value
            .and_then(|value| entity.set_value(column.name(), value))
            .with_context(|| {
                format!(
                    "While reading column `{}` of {}",
                    column.name(),
                    metadata.type_name()
                )
            });
        if let Err(error) = result {
            log::error!("{:#}", error);
            return Err(error);
        }
    }
    Ok(entity)
}
