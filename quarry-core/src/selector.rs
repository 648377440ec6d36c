use crate::{Value, strip_parameter_sigil};
use std::borrow::Cow;

/// Ordered `(column, value)` pairs supplied by the caller.
///
/// The same selector drives both generated predicates (`select_by`,
/// `delete_by`) and the named parameters of caller supplied SQL
/// (`select_by_sql`, `execute`).
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Selector {
    entries: Vec<(Cow<'static, str>, Value)>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Flattens the selector into `(column, value)` pairs.
    ///
    /// A leading `@`, `:` or `$` is stripped from every name. When a name
    /// repeats, the last value wins and keeps the position of the first one.
    pub fn normalize(&self) -> Vec<(&str, &Value)> {
        let mut result: Vec<(&str, &Value)> = Vec::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let name = strip_parameter_sigil(name);
            match result.iter_mut().find(|(k, _)| *k == name) {
                Some(entry) => entry.1 = value,
                None => result.push((name, value)),
            }
        }
        result
    }
}

impl<K: Into<Cow<'static, str>>, V: Into<Value>> FromIterator<(K, V)> for Selector {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<V: Into<Value>, const N: usize> From<[(&'static str, V); N]> for Selector {
    fn from(value: [(&'static str, V); N]) -> Self {
        value.into_iter().collect()
    }
}

/// Builds a [`Selector`] from `name: value` pairs.
///
/// ```rust
/// use quarry_core::selector;
/// let selector = selector! { Name: "Ada", Age: 36 };
/// assert_eq!(selector.len(), 2);
/// ```
#[macro_export]
macro_rules! selector {
    () => {
        $crate::Selector::new()
    };
    ($($name:ident : $value:expr),+ $(,)?) => {
        $crate::Selector::new()
            $(.with(stringify!($name), $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_caller_order() {
        let selector = Selector::new().with("B", 2).with("A", 1);
        assert_eq!(
            selector.normalize(),
            [("B", &Value::Int32(Some(2))), ("A", &Value::Int32(Some(1)))]
        );
    }

    #[test]
    fn strips_sigils_and_merges_duplicates() {
        let selector = Selector::from([("@Id", 1), ("Name", 2), ("Id", 3)]);
        assert_eq!(
            selector.normalize(),
            [("Id", &Value::Int32(Some(3))), ("Name", &Value::Int32(Some(2)))]
        );
    }

    #[test]
    fn macro_and_iterator() {
        let selector = selector! { Name: "Ada", Age: 36i64 };
        assert_eq!(
            selector,
            [("Name", Value::from("Ada")), ("Age", Value::Int64(Some(36)))]
                .into_iter()
                .collect::<Selector>()
        );
        assert!(selector!().is_empty());
    }
}
