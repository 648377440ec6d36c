use crate::{Driver, Executor, Result};
use std::future::Future;

pub trait Connection: Executor {
    /// Establish a connection to the given URL.
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, committed or rolled back through the returned value.
    fn begin(
        &mut self,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Transaction<'_>>> + Send;
}
