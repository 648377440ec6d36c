use quarry_core::{Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// Statement text plus the values bound to its named parameters.
///
/// The compiled statement lives in the connection's statement cache, keyed
/// by the text, so rebinding and running it again does not recompile it.
#[derive(Debug, Clone)]
pub struct SqlitePrepared {
    pub(crate) sql: Arc<str>,
    pub(crate) params: Vec<(String, Value)>,
}

impl SqlitePrepared {
    pub(crate) fn new(sql: impl Into<Arc<str>>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }
}

impl Prepared for SqlitePrepared {
    fn bind(&mut self, name: &str, value: Value) -> Result<&mut Self> {
        match self.params.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name.to_string(), value)),
        }
        Ok(self)
    }

    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.params.clear();
        Ok(self)
    }
}

impl Display for SqlitePrepared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}
