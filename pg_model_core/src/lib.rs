#![forbid(unsafe_code)]
//! Core types for mapping Rust structs onto PostgreSQL rows
//!
//! Provides the [`Model`] trait (usually derived with `#[derive(Model)]`), the dynamically typed [`Value`] used for
//! bound parameters and decoded columns, and the ordered [`Record`] that carries one row between the two.
//!
//! [`TryFromRow`] converts a [`tokio_postgres::Row`] into a [`Record`]; no connection handling lives in this crate.
//!
//! [`tokio_postgres::Row`]: https://docs.rs/tokio-postgres/0.7/tokio_postgres/row/struct.Row.html

//reexports
pub use pg_model_derive::*;
pub use postgres_types::{FromSql, ToSql};
pub use tokio_postgres::{row::Row, Error as SqlError};

pub use chrono;
pub use rust_decimal;
pub use serde_json;
pub use uuid;

mod error;
pub use error::{MapError, ValueError};

mod interval;
pub use interval::Interval;

mod value;
pub use value::{FromValue, Value};

mod record;
pub use record::{Record, RecordDisplay};

mod model;
pub use model::{Model, ModelDisplay};

mod source;
pub use source::RecordSource;

/// Implementation of `TryFromRow` for records
mod try_from_row;
pub use try_from_row::TryFromRow;
