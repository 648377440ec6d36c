use crate::Value;
use std::borrow::Cow;

/// Declared column of a record type.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name, used verbatim in generated SQL.
    pub name: Cow<'static, str>,
    /// Declared type, as the typed null of its [`Value`] variant.
    pub value: Value,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            nullable: false,
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
