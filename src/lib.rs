//! Typed records in and out of relational stores.
//!
//! ```ignore
//! use quarry::{Clause, DataContext, Entity, selector};
//! use quarry_sqlite::SqliteDriver;
//!
//! #[derive(Entity, Default)]
//! #[table("people")]
//! #[primary_key("id")]
//! struct Person {
//!     id: i64,
//!     name: String,
//!     age: Option<i32>,
//! }
//!
//! let context = DataContext::from_url(SqliteDriver::new(), "sqlite://people.sqlite?timeout=5")?;
//! context.create(&Person { id: 1, name: "Ada".into(), age: None }).await?;
//! let ada = context
//!     .single_by::<Person>(&selector! { id: 1i64 }, Clause::And)
//!     .await?;
//! ```
pub use quarry_core::*;
pub use quarry_macros::*;
