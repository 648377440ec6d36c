use crate::{ColumnDef, Result, Value};
use std::borrow::Cow;

/// A record type the data context can read and write.
///
/// Usually derived with `#[derive(Entity)]`, which also honors the
/// `#[table("..")]`, `#[primary_key("..")]`, `#[column_name("..")]` and
/// `#[skip]` attributes.
pub trait Entity: Default + Send + Sync + 'static {
    /// Declared table, primary key and columns. Called once per type by
    /// [`crate::MetadataCache`].
    fn describe() -> EntityDescriptor;

    /// Current value of `column`, or `None` when the type has no such column.
    fn get_value(&self, column: &str) -> Option<Value>;

    /// Assign `value` to `column`. Unknown columns are ignored.
    fn set_value(&mut self, column: &str, value: Value) -> Result<()>;
}

/// Builder for the declarations of a record type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub type_name: Cow<'static, str>,
    pub table: Option<Cow<'static, str>>,
    pub primary_key: Option<Cow<'static, str>>,
    pub columns: Vec<ColumnDef>,
}

impl EntityDescriptor {
    pub fn new(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            primary_key: None,
            columns: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<Cow<'static, str>>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn primary_key(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }
}
