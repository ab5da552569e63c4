use pg_model_core::{Record, Value};
use tracing::{debug, error, info, warn};

use crate::{
	connection::{Connection, PgConnection},
	statement::{self, Columns, Predicate},
	DbConfig, DbError,
};

type Connector<C> = Box<dyn Fn() -> Result<C, DbError> + Send>;

/// Owns the application's single database connection and runs statements on it
///
/// The connection is opened on first use and then reused for every call until [`close`](Database::close). Create
/// one `Database` at startup and hand `&mut` references to whatever needs it; all statements serialize through it.
/// To share it between threads, wrap it in a `Mutex`.
pub struct Database<C = PgConnection> {
	connector: Connector<C>,
	connection: Option<C>,
}

impl Database<PgConnection> {
	/// Does not connect yet; the first statement (or [`connection`](Database::connection)) does
	pub fn new(config: DbConfig) -> Self {
		Database::with_connector(move || PgConnection::connect(&config))
	}
}

impl<C: Connection> Database<C> {
	pub fn with_connector<F>(connector: F) -> Self
	where
		F: Fn() -> Result<C, DbError> + Send + 'static,
	{
		Database {
			connector: Box::new(connector),
			connection: None,
		}
	}

	/// Wraps an already open connection. Once closed it cannot be reopened
	pub fn from_connection(connection: C) -> Self {
		Database {
			connector: Box::new(|| Err(DbError::Connection("connection was closed and has no connector".into()))),
			connection: Some(connection),
		}
	}

	/// The shared connection, established on the first call only
	pub fn connection(&mut self) -> Result<&mut C, DbError> {
		let connection = match self.connection.take() {
			Some(connection) => connection,
			None => {
				debug!("opening database connection");
				(self.connector)()?
			},
		};
		Ok(self.connection.insert(connection))
	}

	pub fn is_connected(&self) -> bool {
		self.connection.is_some()
	}

	/// Drops the connection; an open transaction is discarded by the server
	pub fn close(&mut self) {
		if self.connection.take().is_some() {
			info!("closed database connection");
		}
	}

	/// Commits the current transaction. Does nothing before the first connection
	pub fn commit(&mut self) -> Result<(), DbError> {
		match self.connection.as_mut() {
			Some(connection) => connection.commit(),
			None => Ok(()),
		}
	}

	/// Rolls back the current transaction. Does nothing before the first connection
	pub fn rollback(&mut self) -> Result<(), DbError> {
		match self.connection.as_mut() {
			Some(connection) => connection.rollback(),
			None => Ok(()),
		}
	}

	/// Inserts one row and returns it as stored, server defaults included
	///
	/// Columns starting with `_` are left out. If the statement fails the transaction is rolled back and
	/// [`DbError::InsertFailed`] is returned; validation and connection errors are returned as they are.
	pub fn insert_record<S: AsRef<str>>(
		&mut self,
		table: &str,
		columns: &[S],
		values: Vec<Value>,
		autocommit: bool,
	) -> Result<Record, DbError> {
		let statement = statement::insert(table, columns, values)?;
		let connection = self.connection()?;

		let outcome = connection.query(&statement).and_then(|mut rows| {
			if autocommit {
				connection.commit()?;
			}
			Ok(rows.pop().unwrap_or_default())
		});

		outcome.or_else(|source| {
			error!(table, error = %source, "insert_record failed");
			if let Err(e) = self.rollback() {
				warn!(error = %e, "rollback after failed insert also failed");
			}
			Err(DbError::InsertFailed {
				table: table.to_owned(),
				source: Box::new(source),
			})
		})
	}

	/// Rows of `table` matching `predicate` (every row when it is empty), in the order the server returns them
	pub fn select_records(
		&mut self,
		table: &str,
		columns: &Columns,
		predicate: &Predicate,
	) -> Result<Vec<Record>, DbError> {
		let statement = statement::select(table, columns, predicate);
		self.connection()?.query(&statement)
	}

	/// Updates the rows matching `predicate` and returns how many changed
	///
	/// The predicate must not be empty and `columns` and `values` must line up; both are checked before anything is
	/// sent to the server.
	pub fn update_record<S: AsRef<str>>(
		&mut self,
		table: &str,
		columns: &[S],
		values: Vec<Value>,
		predicate: &Predicate,
		autocommit: bool,
	) -> Result<u64, DbError> {
		let statement = statement::update(table, columns, values, predicate)?;
		let affected = self.connection()?.execute(&statement)?;
		if autocommit {
			self.commit()?;
		}
		Ok(affected)
	}
}
