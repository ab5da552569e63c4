//! Maps Rust structs to PostgreSQL rows over a single, lazily opened connection
//!
//! * [`Model`] (derived with `#[derive(Model)]`) describes a table and converts instances to and from [`Record`]s
//! * [`Database`] owns the connection and runs parameterized INSERT, SELECT and UPDATE statements
//! * [`Persist`] adds `dump`, `from_database_id` and `update` to every model
//! * [`bootstrap`] creates the database and loads its schema on first run

pub use pg_model_core::*;

pub mod bootstrap;
pub mod config;
pub mod connection;
mod database;
mod error;
mod persist;
pub mod statement;

pub use config::{ConfigOverrides, DbConfig};
pub use connection::{Connection, PgConnection};
pub use database::Database;
pub use error::{BoxError, DbError};
pub use persist::Persist;
pub use statement::{Columns, Comparison, Predicate, Statement};
