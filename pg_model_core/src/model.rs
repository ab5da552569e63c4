use std::fmt;

use crate::{MapError, Record, RecordSource, Value};

/// A struct persisted as one row of [`TABLE`](Model::TABLE)
///
/// Normally implemented with `#[derive(Model)]`:
///
/// ```ignore
/// #[derive(Model)]
/// #[model(table = "users")]
/// struct User {
/// 	#[model(primary_key, generated)]
/// 	id: Option<i32>,
/// 	name: String,
/// 	age: i32,
/// 	#[model(skip)]
/// 	cache: Vec<u8>,
/// }
/// ```
///
/// Fields marked `skip` are never written or read and come back as `Default::default()`.
pub trait Model: Sized {
	/// Name of the backing table
	const TABLE: &'static str;
	/// Persisted columns, in declaration order
	const COLUMNS: &'static [&'static str];
	/// Columns forming the primary key, a subset of [`COLUMNS`](Model::COLUMNS)
	const PRIMARY_KEY: &'static [&'static str];
	/// Columns the server fills in when the instance holds `NULL` (serials, defaults)
	const GENERATED: &'static [&'static str] = &[];

	/// Every persisted column with its current value
	fn to_record(&self) -> Record;

	fn from_record(record: Record) -> Result<Self, MapError>;

	/// Builds an instance from any [`RecordSource`], reading each persisted column and treating absent ones as `NULL`
	fn from_source<S: RecordSource + ?Sized>(source: &S) -> Result<Self, MapError> {
		let record: Record = Self::COLUMNS
			.iter()
			.map(|&column| (column, source.field(column).unwrap_or(Value::Null)))
			.collect();
		Self::from_record(record)
	}

	/// Primary key values in [`PRIMARY_KEY`](Model::PRIMARY_KEY) order
	fn key_values(&self) -> Vec<Value> {
		let mut record = self.to_record();
		Self::PRIMARY_KEY
			.iter()
			.map(|column| record.remove(column).unwrap_or(Value::Null))
			.collect()
	}

	fn display(&self) -> ModelDisplay<'_, Self> {
		ModelDisplay(self)
	}
}

/// Helper struct returned by [`Model::display`]
pub struct ModelDisplay<'a, M>(&'a M);

impl<M: Model> fmt::Display for ModelDisplay<'_, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0.to_record().display(M::TABLE), f)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use crate::ValueError;

	use super::*;

	#[derive(Debug, PartialEq, crate::Model)]
	#[model(crate = "crate", table = "users")]
	struct User {
		#[model(primary_key, generated)]
		id: Option<i32>,
		name: String,
		age: Option<i32>,
		#[model(skip)]
		scratch: Vec<u8>,
	}

	#[derive(Debug, PartialEq, crate::Model)]
	#[model(crate = "crate")]
	struct PageVisit {
		#[model(primary_key)]
		page: String,
		#[model(primary_key, column = "visited_on")]
		day: chrono::NaiveDate,
		hits: i64,
	}

	#[test]
	fn derived_metadata() {
		assert_eq!(User::TABLE, "users");
		assert_eq!(User::COLUMNS, ["id", "name", "age"]);
		assert_eq!(User::PRIMARY_KEY, ["id"]);
		assert_eq!(User::GENERATED, ["id"]);

		assert_eq!(PageVisit::TABLE, "page_visit");
		assert_eq!(PageVisit::COLUMNS, ["page", "visited_on", "hits"]);
		assert_eq!(PageVisit::PRIMARY_KEY, ["page", "visited_on"]);
		assert!(PageVisit::GENERATED.is_empty());
	}

	#[test]
	fn skipped_fields_stay_out_of_records() {
		let user = User {
			id: None,
			name: "Alice".to_owned(),
			age: Some(30),
			scratch: vec![1, 2, 3],
		};
		let record = user.to_record();
		assert_eq!(record.columns().collect::<Vec<_>>(), ["id", "name", "age"]);

		let back = User::from_record(record).unwrap();
		assert!(back.scratch.is_empty());
		assert_eq!(back.name, "Alice");
	}

	#[test]
	fn from_record_needs_every_column() {
		let record = Record::new().with("id", 1).with("name", "Alice");
		assert_eq!(User::from_record(record), Err(MapError::MissingColumn("age".to_owned())));

		let record = Record::new().with("id", 1).with("name", Value::Null).with("age", 3);
		assert_eq!(
			User::from_record(record),
			Err(MapError::Value {
				column: "name".to_owned(),
				source: ValueError::Mismatch {
					expected: "text",
					found: "null",
				},
			})
		);
	}

	#[test]
	fn from_source_defaults_missing_columns_to_null() {
		let mut parsed = HashMap::new();
		parsed.insert("name".to_owned(), Value::from("Alice"));
		parsed.insert("nickname".to_owned(), Value::from("Al"));

		let user = User::from_source(&parsed).unwrap();
		assert_eq!(
			user,
			User {
				id: None,
				name: "Alice".to_owned(),
				age: None,
				scratch: Vec::new(),
			}
		);
	}

	#[test]
	fn key_values_follow_key_order() {
		let visit = PageVisit {
			page: "/".to_owned(),
			day: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
			hits: 9,
		};
		assert_eq!(
			visit.key_values(),
			[Value::from("/"), Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())]
		);
	}

	#[test]
	fn display_renders_public_attributes() {
		let user = User {
			id: Some(7),
			name: "Alice".to_owned(),
			age: None,
			scratch: vec![9],
		};
		let rendered = user.display().to_string();
		assert!(rendered.contains("Item from table: users\n"));
		assert!(rendered.contains("\tid: 7\n\tname: Alice\n\tage: NULL\n"));
		assert!(!rendered.contains("scratch"));
	}
}
