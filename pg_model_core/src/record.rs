use std::fmt;

use crate::{FromValue, MapError, Value};

/// One row as an ordered column → value mapping
///
/// Column order is insertion order, which for decoded rows is the order the server returned the columns in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
	fields: Vec<(String, Value)>,
}

impl Record {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Record {
			fields: Vec::with_capacity(capacity),
		}
	}

	/// Sets `column`, keeping its position if already present. Returns the previous value
	pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		let column = column.into();
		let value = value.into();
		match self.fields.iter_mut().find(|(c, _)| *c == column) {
			Some((_, slot)) => Some(std::mem::replace(slot, value)),
			None => {
				self.fields.push((column, value));
				None
			},
		}
	}

	/// Builder form of [`insert`](Self::insert)
	pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(column, value);
		self
	}

	pub fn get(&self, column: &str) -> Option<&Value> {
		self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
	}

	pub fn contains(&self, column: &str) -> bool {
		self.get(column).is_some()
	}

	pub fn remove(&mut self, column: &str) -> Option<Value> {
		let pos = self.fields.iter().position(|(c, _)| c == column)?;
		Some(self.fields.remove(pos).1)
	}

	/// Removes `column` and converts it, naming the column in any error
	pub fn take<T: FromValue>(&mut self, column: &str) -> Result<T, MapError> {
		let value = self
			.remove(column)
			.ok_or_else(|| MapError::MissingColumn(column.to_owned()))?;
		T::from_value(value).map_err(|source| MapError::Value {
			column: column.to_owned(),
			source,
		})
	}

	pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
		self.fields.retain(|(c, v)| keep(c, v));
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn columns(&self) -> impl Iterator<Item = &str> {
		self.fields.iter().map(|(c, _)| c.as_str())
	}

	pub fn values(&self) -> impl Iterator<Item = &Value> {
		self.fields.iter().map(|(_, v)| v)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.fields.iter().map(|(c, v)| (c.as_str(), v))
	}

	/// Splits into parallel column and value lists, in order
	pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
		self.fields.into_iter().unzip()
	}

	/// Human readable rendering under a table heading, for diagnostics
	pub fn display<'a>(&'a self, table: &'a str) -> RecordDisplay<'a> {
		RecordDisplay { table, record: self }
	}
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for Record {
	fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
		let mut record = Record::new();
		for (c, v) in iter {
			record.insert(c, v);
		}
		record
	}
}

impl IntoIterator for Record {
	type Item = (String, Value);
	type IntoIter = std::vec::IntoIter<(String, Value)>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.into_iter()
	}
}

/// Helper struct returned by [`Record::display`]
pub struct RecordDisplay<'a> {
	table: &'a str,
	record: &'a Record,
}

const RULE: &str = "----------------------------------------";

impl fmt::Display for RecordDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "{}", RULE)?;
		writeln!(f, "Item from table: {}", self.table)?;
		for (column, value) in self.record.iter() {
			writeln!(f, "\t{}: {}", column, value)?;
		}
		writeln!(f, "{}", RULE)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ValueError;

	fn alice() -> Record {
		Record::new().with("id", 1).with("name", "Alice").with("age", 30)
	}

	#[test]
	fn insert_replaces_in_place() {
		let mut record = alice();
		assert_eq!(record.insert("name", "Bob"), Some(Value::from("Alice")));
		assert_eq!(record.columns().collect::<Vec<_>>(), ["id", "name", "age"]);
		assert_eq!(record.get("name"), Some(&Value::from("Bob")));
	}

	#[test]
	fn take_reports_the_column() {
		let mut record = alice();
		assert_eq!(record.take::<i32>("age"), Ok(30));
		assert_eq!(record.take::<i32>("age"), Err(MapError::MissingColumn("age".to_owned())));
		assert_eq!(
			record.take::<i64>("name"),
			Err(MapError::Value {
				column: "name".to_owned(),
				source: ValueError::Mismatch {
					expected: "integer",
					found: "text",
				},
			})
		);
	}

	#[test]
	fn into_parts_keeps_order() {
		let (columns, values) = alice().into_parts();
		assert_eq!(columns, ["id", "name", "age"]);
		assert_eq!(values, [Value::Int(1), Value::from("Alice"), Value::Int(30)]);
	}

	#[test]
	fn display_lists_columns() {
		let record = Record::new().with("name", "Alice").with("age", 30);
		let rendered = record.display("users").to_string();
		assert_eq!(
			rendered,
			format!("{0}\nItem from table: users\n\tname: Alice\n\tage: 30\n{0}\n", RULE)
		);
	}
}
