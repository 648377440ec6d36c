use crate::{Driver, Error, Prepared, Result, Value, truncate_long};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// A query ready to be executed by an [`crate::Executor`].
///
/// Raw SQL carries no parameters; anything with parameters is prepared first.
pub enum Query<D: Driver> {
    /// Unprepared SQL text.
    Raw(String),
    /// Driver prepared handle.
    Prepared(D::Prepared),
}

impl<D: Driver> Query<D> {
    pub fn is_prepared(&self) -> bool {
        matches!(self, Query::Prepared(..))
    }
    /// Remove all the previously bound values
    pub fn clear_bindings(&mut self) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg("Cannot clear bindings of a raw query"));
        };
        prepared.clear_bindings()?;
        Ok(self)
    }
    /// Bind `value` to the named parameter `name` (sigil included).
    pub fn bind(&mut self, name: &str, value: Value) -> Result<&mut Self> {
        let Self::Prepared(prepared) = self else {
            return Err(Error::msg(format!("Cannot bind `{name}` on a raw query")));
        };
        prepared.bind(name, value)?;
        Ok(self)
    }
}

impl<D: Driver> From<&str> for Query<D> {
    fn from(value: &str) -> Self {
        Query::Raw(value.into())
    }
}

impl<D: Driver> From<String> for Query<D> {
    fn from(value: String) -> Self {
        Query::Raw(value)
    }
}

impl<D: Driver> Display for Query<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Raw(query) => write!(f, "{}", truncate_long!(query)),
            Query::Prepared(query) => query.fmt(f),
        }
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted / affected identifier when available.
    pub last_affected_id: Option<i64>,
}

impl RowsAffected {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_affected_id: None,
        }
    }
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// Index of the column `name`, matched exactly first and then ignoring ASCII case.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|v| v == name)
            .or_else(|| self.labels.iter().position(|v| v.eq_ignore_ascii_case(name)))
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|i| &self.values[i])
    }
}

/// Heterogeneous items emitted by `Executor::run` combining rows and modify results.
#[derive(Debug)]
pub enum QueryResult {
    /// A labeled row.
    Row(RowLabeled),
    /// A modify effect aggregation.
    Affected(RowsAffected),
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_affected_sum() {
        let mut total = RowsAffected::default();
        total.extend([
            RowsAffected::new(2),
            RowsAffected {
                rows_affected: 1,
                last_affected_id: Some(7),
            },
            RowsAffected::new(0),
        ]);
        assert_eq!(total.rows_affected, 3);
        assert_eq!(total.last_affected_id, Some(7));
    }

    #[test]
    fn column_lookup() {
        let row = RowLabeled::new(
            ["Id".to_string(), "name".to_string()].into(),
            [Value::Int64(Some(1)), Value::Varchar(Some("a".into()))].into(),
        );
        assert_eq!(row.get_column("Id"), Some(&Value::Int64(Some(1))));
        assert_eq!(row.position("Name"), Some(1));
        assert_eq!(row.get_column("missing"), None);
    }
}
