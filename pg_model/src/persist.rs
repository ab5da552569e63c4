use pg_model_core::{MapError, Model, Record, Value};

use crate::{
	connection::Connection,
	statement::{Columns, Predicate},
	Database, DbError,
};

/// Database operations available on every [`Model`]
pub trait Persist: Model {
	/// Inserts the instance and returns the primary key of the new row, in [`Model::PRIMARY_KEY`] order
	///
	/// Generated columns holding `NULL` are left to the server. Nothing is committed.
	fn dump<C: Connection>(&self, db: &mut Database<C>) -> Result<Vec<Value>, DbError> {
		let (columns, values) = writable_record::<Self>(self.to_record()).into_parts();
		let mut inserted = db.insert_record(Self::TABLE, &columns, values, false)?;
		Self::PRIMARY_KEY
			.iter()
			.map(|&column| {
				inserted
					.remove(column)
					.ok_or_else(|| MapError::MissingColumn(column.to_owned()).into())
			})
			.collect()
	}

	/// Loads the row whose primary key equals `ids`, given in [`Model::PRIMARY_KEY`] order
	fn from_database_id<C: Connection>(db: &mut Database<C>, ids: &[Value]) -> Result<Self, DbError> {
		if ids.len() != Self::PRIMARY_KEY.len() {
			return Err(DbError::KeyArity {
				table: Self::TABLE.to_owned(),
				expected: Self::PRIMARY_KEY.len(),
				found: ids.len(),
			});
		}

		let predicate = Self::PRIMARY_KEY
			.iter()
			.zip(ids)
			.fold(Predicate::new(), |predicate, (&column, id)| predicate.equal(column, id.clone()));

		let mut rows = db
			.select_records(Self::TABLE, &Columns::All, &predicate)
			.map_err(|source| DbError::Lookup {
				table: Self::TABLE.to_owned(),
				source: Box::new(source),
			})?;

		if rows.is_empty() {
			return Err(DbError::NotFound {
				table: Self::TABLE.to_owned(),
				key: ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
			});
		}
		Ok(Self::from_record(rows.swap_remove(0))?)
	}

	/// Writes every non-key column to the row identified by the instance's primary key. Nothing is committed
	fn update<C: Connection>(&self, db: &mut Database<C>) -> Result<u64, DbError> {
		let mut record = writable_record::<Self>(self.to_record());
		let mut predicate = Predicate::new();
		for &column in Self::PRIMARY_KEY {
			match record.remove(column) {
				Some(value) if !value.is_null() => predicate = predicate.equal(column, value),
				_ => {
					return Err(DbError::MissingKey {
						table: Self::TABLE.to_owned(),
						column: column.to_owned(),
					})
				},
			}
		}
		let (columns, values) = record.into_parts();
		db.update_record(Self::TABLE, &columns, values, &predicate, false)
	}
}

impl<M: Model> Persist for M {}

/// Drops generated columns that are still `NULL` so the server default applies
fn writable_record<M: Model>(mut record: Record) -> Record {
	record.retain(|column, value| !(value.is_null() && M::GENERATED.iter().any(|g| *g == column)));
	record
}
