//! Builds parameterized INSERT, SELECT and UPDATE statements
//!
//! Identifiers are always double-quoted and values are always bound as `$n` parameters, never spliced into the text.

use std::fmt::Write;

use pg_model_core::Value;

use crate::DbError;

/// Leading character of columns that must never be written by [`insert`]
pub const PRIVATE_MARKER: char = '_';

/// SQL text plus the values bound to its `$1..$n` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
	pub sql: String,
	pub params: Vec<Value>,
}

impl Statement {
	pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
		Statement {
			sql: sql.into(),
			params,
		}
	}

	fn bind(&mut self, value: Value) {
		self.params.push(value);
		let _ = write!(self.sql, "${}", self.params.len());
	}
}

/// Quotes an identifier, doubling any embedded `"`
pub fn quote_ident(ident: &str) -> String {
	format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn is_private(column: &str) -> bool {
	column.starts_with(PRIVATE_MARKER)
}

/// Column selection for [`select`]
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Columns {
	/// `*`, passed through unquoted
	#[default]
	All,
	List(Vec<String>),
}

impl Columns {
	pub fn list<I, S>(columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Columns::List(columns.into_iter().map(Into::into).collect())
	}
}

/// Comparison applied to one column of a [`Predicate`]
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
	Equal(Value),
	NotEqual(Value),
	GreaterThan(Value),
	GreaterThanOrEqual(Value),
	LessThan(Value),
	LessThanOrEqual(Value),
	Like(String),
	In(Vec<Value>),
	IsNull,
	IsNotNull,
}

/// Conditions joined with `AND`. An empty predicate matches every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
	conditions: Vec<(String, Comparison)>,
}

impl Predicate {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, column: impl Into<String>, comparison: Comparison) -> Self {
		self.conditions.push((column.into(), comparison));
		self
	}

	/// Shorthand for `with(column, Comparison::Equal(value))`
	pub fn equal(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
		self.with(column, Comparison::Equal(value.into()))
	}

	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	pub fn len(&self) -> usize {
		self.conditions.len()
	}

	/// Appends ` WHERE ...` unless the predicate is empty
	fn write_where(&self, statement: &mut Statement) {
		if self.is_empty() {
			return;
		}
		statement.sql.push_str(" WHERE ");
		for (i, (column, comparison)) in self.conditions.iter().enumerate() {
			if i > 0 {
				statement.sql.push_str(" AND ");
			}
			write_condition(statement, column, comparison);
		}
	}
}

fn write_condition(statement: &mut Statement, column: &str, comparison: &Comparison) {
	let column = quote_ident(column);
	let (op, value) = match comparison {
		Comparison::Equal(v) => ("=", v.clone()),
		Comparison::NotEqual(v) => ("<>", v.clone()),
		Comparison::GreaterThan(v) => (">", v.clone()),
		Comparison::GreaterThanOrEqual(v) => (">=", v.clone()),
		Comparison::LessThan(v) => ("<", v.clone()),
		Comparison::LessThanOrEqual(v) => ("<=", v.clone()),
		Comparison::Like(pattern) => ("LIKE", Value::Text(pattern.clone())),
		Comparison::IsNull => {
			let _ = write!(statement.sql, "{} IS NULL", column);
			return;
		},
		Comparison::IsNotNull => {
			let _ = write!(statement.sql, "{} IS NOT NULL", column);
			return;
		},
		// `IN ()` is not valid SQL and matches nothing anyway
		Comparison::In(values) if values.is_empty() => {
			statement.sql.push_str("FALSE");
			return;
		},
		Comparison::In(values) => {
			let _ = write!(statement.sql, "{} IN (", column);
			for (i, v) in values.iter().enumerate() {
				if i > 0 {
					statement.sql.push_str(", ");
				}
				statement.bind(v.clone());
			}
			statement.sql.push(')');
			return;
		},
	};
	let _ = write!(statement.sql, "{} {} ", column, op);
	statement.bind(value);
}

fn check_lengths(columns: usize, values: usize) -> Result<(), DbError> {
	if columns != values {
		return Err(DbError::ColumnCount { columns, values });
	}
	Ok(())
}

fn column_list<'a>(columns: impl Iterator<Item = &'a str>) -> String {
	columns.map(quote_ident).collect::<Vec<_>>().join(", ")
}

/// `INSERT INTO .. RETURNING *`, leaving out private columns
pub fn insert<S: AsRef<str>>(table: &str, columns: &[S], values: Vec<Value>) -> Result<Statement, DbError> {
	check_lengths(columns.len(), values.len())?;

	let (columns, values): (Vec<&str>, Vec<Value>) = columns
		.iter()
		.map(AsRef::as_ref)
		.zip(values)
		.filter(|(column, _)| !is_private(column))
		.unzip();

	let table = quote_ident(table);
	if columns.is_empty() {
		return Ok(Statement::new(format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table), Vec::new()));
	}

	let mut statement = Statement::new(
		format!("INSERT INTO {} ({}) VALUES (", table, column_list(columns.into_iter())),
		Vec::with_capacity(values.len()),
	);
	for (i, value) in values.into_iter().enumerate() {
		if i > 0 {
			statement.sql.push_str(", ");
		}
		statement.bind(value);
	}
	statement.sql.push_str(") RETURNING *");
	Ok(statement)
}

/// `SELECT <columns> FROM <table> [WHERE ..]`
pub fn select(table: &str, columns: &Columns, predicate: &Predicate) -> Statement {
	let columns = match columns {
		Columns::List(list) if !list.is_empty() => column_list(list.iter().map(String::as_str)),
		_ => "*".to_owned(),
	};
	let mut statement = Statement::new(format!("SELECT {} FROM {}", columns, quote_ident(table)), Vec::new());
	predicate.write_where(&mut statement);
	statement
}

/// `UPDATE <table> SET .. WHERE ..`; SET values are bound before WHERE values
pub fn update<S: AsRef<str>>(
	table: &str,
	columns: &[S],
	values: Vec<Value>,
	predicate: &Predicate,
) -> Result<Statement, DbError> {
	check_lengths(columns.len(), values.len())?;
	if columns.is_empty() {
		return Err(DbError::NoColumns(table.to_owned()));
	}
	if predicate.is_empty() {
		return Err(DbError::UnboundedUpdate(table.to_owned()));
	}

	let mut statement = Statement::new(format!("UPDATE {} SET ", quote_ident(table)), Vec::new());
	for (i, (column, value)) in columns.iter().zip(values).enumerate() {
		if i > 0 {
			statement.sql.push_str(", ");
		}
		statement.sql.push_str(&quote_ident(column.as_ref()));
		statement.sql.push_str(" = ");
		statement.bind(value);
	}
	predicate.write_where(&mut statement);
	Ok(statement)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quotes_identifiers() {
		assert_eq!(quote_ident("users"), "\"users\"");
		assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
	}

	#[test]
	fn insert_binds_every_value() {
		let statement = insert("users", &["name", "age"], vec!["Alice".into(), 30.into()]).unwrap();
		assert_eq!(statement.sql, r#"INSERT INTO "users" ("name", "age") VALUES ($1, $2) RETURNING *"#);
		assert_eq!(statement.params, [Value::from("Alice"), Value::Int(30)]);
	}

	#[test]
	fn insert_drops_private_columns() {
		let statement = insert(
			"users",
			&["_cache", "name", "__secret", "age"],
			vec![Value::Int(1), "Alice".into(), "x".into(), 30.into()],
		)
		.unwrap();
		assert_eq!(statement.sql, r#"INSERT INTO "users" ("name", "age") VALUES ($1, $2) RETURNING *"#);
		assert_eq!(statement.params, [Value::from("Alice"), Value::Int(30)]);
		assert!(!statement.sql.contains("_cache"));
	}

	#[test]
	fn insert_without_columns_uses_defaults() {
		let statement = insert::<&str>("audit", &[], Vec::new()).unwrap();
		assert_eq!(statement.sql, r#"INSERT INTO "audit" DEFAULT VALUES RETURNING *"#);
		assert!(statement.params.is_empty());
	}

	#[test]
	fn insert_rejects_misaligned_values() {
		let err = insert("users", &["name"], vec!["Alice".into(), 30.into()]).unwrap_err();
		assert!(matches!(err, DbError::ColumnCount { columns: 1, values: 2 }));
	}

	#[test]
	fn select_everything() {
		let statement = select("users", &Columns::All, &Predicate::new());
		assert_eq!(statement.sql, r#"SELECT * FROM "users""#);
		assert!(statement.params.is_empty());
	}

	#[test]
	fn select_with_predicate() {
		let predicate = Predicate::new()
			.with("age", Comparison::GreaterThan(18.into()))
			.with("name", Comparison::Like("A%".to_owned()))
			.with("deleted_at", Comparison::IsNull);
		let statement = select("users", &Columns::list(["id", "name"]), &predicate);
		assert_eq!(
			statement.sql,
			r#"SELECT "id", "name" FROM "users" WHERE "age" > $1 AND "name" LIKE $2 AND "deleted_at" IS NULL"#
		);
		assert_eq!(statement.params, [Value::Int(18), Value::from("A%")]);
	}

	#[test]
	fn in_lists() {
		let predicate = Predicate::new()
			.with("id", Comparison::In(vec![1.into(), 2.into(), 3.into()]))
			.equal("active", true);
		let statement = select("users", &Columns::All, &predicate);
		assert_eq!(
			statement.sql,
			r#"SELECT * FROM "users" WHERE "id" IN ($1, $2, $3) AND "active" = $4"#
		);

		let predicate = Predicate::new().equal("active", true).with("id", Comparison::In(Vec::new()));
		let statement = select("users", &Columns::All, &predicate);
		assert_eq!(statement.sql, r#"SELECT * FROM "users" WHERE "active" = $1 AND FALSE"#);
		assert_eq!(statement.params, [Value::Bool(true)]);
	}

	#[test]
	fn update_binds_set_then_where() {
		let predicate = Predicate::new().equal("id", 7);
		let statement = update("users", &["name", "age"], vec!["Bob".into(), 31.into()], &predicate).unwrap();
		assert_eq!(
			statement.sql,
			r#"UPDATE "users" SET "name" = $1, "age" = $2 WHERE "id" = $3"#
		);
		assert_eq!(statement.params, [Value::from("Bob"), Value::Int(31), Value::Int(7)]);
	}

	#[test]
	fn update_validates_before_building() {
		let predicate = Predicate::new().equal("id", 7);
		assert!(matches!(
			update("users", &["name", "age"], vec!["Bob".into()], &predicate),
			Err(DbError::ColumnCount { columns: 2, values: 1 })
		));
		assert!(matches!(
			update::<&str>("users", &[], Vec::new(), &predicate),
			Err(DbError::NoColumns(_))
		));
		assert!(matches!(
			update("users", &["name"], vec!["Bob".into()], &Predicate::new()),
			Err(DbError::UnboundedUpdate(_))
		));
	}
}
