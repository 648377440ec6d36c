mod connection;
mod driver;
mod prepared;
mod sql_writer;
mod transaction;
mod value;

pub use connection::*;
pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
pub use transaction::*;
