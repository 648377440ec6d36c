use crate::{Result, Value};
use std::fmt::Display;

/// A backend prepared statement with named parameters.
///
/// Names are passed with their sigil (`@Id`), as produced by
/// [`crate::SqlWriter::parameter_name`]. A statement is reused across rows of a
/// batch by clearing and binding again.
pub trait Prepared: Send + Sync + Display {
    /// Bind `value` to the parameter `name`, replacing any previous value.
    fn bind(&mut self, name: &str, value: Value) -> Result<&mut Self>;
    /// Remove all the previously bound values.
    fn clear_bindings(&mut self) -> Result<&mut Self>;
}
