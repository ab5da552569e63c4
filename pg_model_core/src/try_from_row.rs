use super::{Record, Row, SqlError, Value};

/// Converts from a [`tokio_postgres::Row`]. The `postgres` crate re-exports the same `Row`, so this works for both clients
///
/// [`tokio_postgres::Row`]: https://docs.rs/tokio-postgres/0.7/tokio_postgres/row/struct.Row.html
pub trait TryFromRow: Sized {
	fn from_row(row: &Row) -> Result<Self, SqlError>;
}

/// Every column of the row, named as the server described it and decoded through [`Value`]
impl TryFromRow for Record {
	fn from_row(row: &Row) -> Result<Self, SqlError> {
		let mut record = Record::with_capacity(row.len());
		for (i, column) in row.columns().iter().enumerate() {
			record.insert(column.name(), row.try_get::<_, Value>(i)?);
		}
		Ok(record)
	}
}
