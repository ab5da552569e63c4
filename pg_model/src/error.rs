use std::{io, path::PathBuf};

use pg_model_core::MapError;
use thiserror::Error;

/// Boxed driver error, so connections other than `postgres` can report failures too
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DbError {
	#[error("Failed to load database configuration: {0}")]
	Config(#[from] ::config::ConfigError),

	#[error("Failed to connect to the database: {0}")]
	Connection(#[source] BoxError),

	#[error("Database query failed: {0}")]
	Query(#[source] BoxError),

	#[error("Insert into `{table}` failed and was rolled back: {source}")]
	InsertFailed {
		table: String,
		#[source]
		source: Box<DbError>,
	},

	#[error("The number of columns ({columns}) must match the number of values ({values})")]
	ColumnCount { columns: usize, values: usize },

	#[error("Update of `{0}` has no columns to set")]
	NoColumns(String),

	#[error("Refusing to update every row of `{0}`: the WHERE predicate is empty")]
	UnboundedUpdate(String),

	#[error("Record id has {found} value(s) but `{table}` has {expected} primary key column(s)")]
	KeyArity {
		table: String,
		expected: usize,
		found: usize,
	},

	#[error("Primary key column `{column}` of `{table}` is null")]
	MissingKey { table: String, column: String },

	#[error("Record id ({key}) not found in `{table}`")]
	NotFound { table: String, key: String },

	#[error("Failed to fetch record from `{table}`: {source}")]
	Lookup {
		table: String,
		#[source]
		source: Box<DbError>,
	},

	#[error("Failed to map row: {0}")]
	Mapping(#[from] MapError),

	#[error("Schema {} could not be read: {source}", .path.display())]
	Schema {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

impl From<postgres::Error> for DbError {
	fn from(e: postgres::Error) -> Self {
		DbError::Query(Box::new(e))
	}
}
