mod as_value;
pub mod blocking;
mod clause;
mod column;
mod config;
mod connection;
mod context;
mod driver;
mod entity;
mod error;
mod executor;
mod mapper;
mod metadata;
mod prepared;
mod query;
mod selector;
mod sql_writer;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use clause::*;
pub use column::*;
pub use config::*;
pub use connection::*;
pub use context::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use mapper::*;
pub use metadata::*;
pub use prepared::*;
pub use query::*;
pub use selector::*;
pub use sql_writer::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
