use crate::{Connection, Prepared, Result, SqlWriter, Transaction};
use std::future::Future;

/// Entry point of a database backend.
pub trait Driver: Send + Sync + Sized + 'static {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter;
    type Prepared: Prepared;
    type Transaction<'c>: Transaction<'c, Driver = Self> + Send;

    /// Human readable name, used in error messages.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Open a new connection to `url`.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Connection>> + Send {
        <Self::Connection as Connection>::connect(url)
    }
}
