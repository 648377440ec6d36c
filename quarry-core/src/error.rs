use std::time::Duration;

/// Typed failures raised by the data context.
///
/// They travel inside [`crate::Error`], either as the error itself or as
/// context around a driver error, and are found with
/// `error.downcast_ref::<DataError>()`.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Could not connect to `{url}` using the {driver} driver")]
    Connection { driver: &'static str, url: String },
    #[error("Entity `{entity}` does not declare a primary key")]
    MissingPrimaryKey { entity: String },
    #[error("Entity `{entity}` is missing field `{field}`")]
    MissingField { entity: String, field: String },
    #[error("Entity `{entity}` has no column `{column}`")]
    UnknownColumn { entity: String, column: String },
    #[error("The operation did not complete within {0:?}")]
    Timeout(Duration),
}
