use thiserror::Error;

/// A [`Value`](crate::Value) could not be converted into the requested Rust type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
	#[error("expected {expected}, found {found}")]
	Mismatch {
		expected: &'static str,
		found: &'static str,
	},

	#[error("{value} does not fit in {target}")]
	OutOfRange { value: i64, target: &'static str },
}

/// Errors raised while turning a [`Record`](crate::Record) into a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
	#[error("column `{0}` is missing from the record")]
	MissingColumn(String),

	#[error("column `{column}`: {source}")]
	Value {
		column: String,
		#[source]
		source: ValueError,
	},
}
