use postgres::{types::ToSql, Client, NoTls};
use pg_model_core::{Record, TryFromRow};
use tracing::{debug, info};

use crate::{statement::Statement, DbConfig, DbError};

/// A live database session that statements run on
///
/// Implemented by [`PgConnection`]; tests substitute their own.
pub trait Connection {
	/// Runs a statement that returns rows
	fn query(&mut self, statement: &Statement) -> Result<Vec<Record>, DbError>;

	/// Runs a statement and returns the number of rows it affected
	fn execute(&mut self, statement: &Statement) -> Result<u64, DbError>;

	/// Runs one or more `;`-separated statements without parameters
	fn batch_execute(&mut self, sql: &str) -> Result<(), DbError>;

	fn commit(&mut self) -> Result<(), DbError>;

	fn rollback(&mut self) -> Result<(), DbError>;
}

/// [`Connection`] over a blocking `postgres` client
///
/// Unless autocommit is on, the first statement after connecting (or after a commit/rollback) opens a transaction
/// that stays open until [`commit`](Connection::commit) or [`rollback`](Connection::rollback).
pub struct PgConnection {
	client: Client,
	transaction: TransactionState,
}

/// Tracks the implicit transaction of a connection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TransactionState {
	autocommit: bool,
	open: bool,
}

impl TransactionState {
	/// Marks the transaction open; true when `BEGIN` has to be sent first
	fn begin(&mut self) -> bool {
		if self.autocommit || self.open {
			return false;
		}
		self.open = true;
		true
	}

	/// Marks the transaction closed; true when there was one to end
	fn end(&mut self) -> bool {
		std::mem::take(&mut self.open)
	}
}

impl PgConnection {
	pub fn connect(config: &DbConfig) -> Result<Self, DbError> {
		let client = config
			.to_pg_config()
			.connect(NoTls)
			.map_err(|e| DbError::Connection(Box::new(e)))?;
		info!(host = %config.host, port = config.port, dbname = %config.name, "connected to database");
		Ok(PgConnection {
			client,
			transaction: TransactionState::default(),
		})
	}

	/// Every statement commits on its own; needed for `CREATE DATABASE`, which cannot run inside a transaction
	pub fn with_autocommit(mut self, autocommit: bool) -> Self {
		self.transaction.autocommit = autocommit;
		self
	}

	fn begin(&mut self) -> Result<(), DbError> {
		if self.transaction.begin() {
			if let Err(e) = self.client.batch_execute("BEGIN") {
				self.transaction.open = false;
				return Err(e.into());
			}
		}
		Ok(())
	}

	fn end(&mut self, command: &str) -> Result<(), DbError> {
		if self.transaction.end() {
			debug!(command, "ending transaction");
			self.client.batch_execute(command)?;
		}
		Ok(())
	}
}

fn params(statement: &Statement) -> Vec<&(dyn ToSql + Sync)> {
	statement.params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Connection for PgConnection {
	fn query(&mut self, statement: &Statement) -> Result<Vec<Record>, DbError> {
		self.begin()?;
		debug!(sql = %statement.sql, params = statement.params.len(), "query");
		self.client
			.query(statement.sql.as_str(), &params(statement))?
			.iter()
			.map(|row| Record::from_row(row).map_err(DbError::from))
			.collect()
	}

	fn execute(&mut self, statement: &Statement) -> Result<u64, DbError> {
		self.begin()?;
		debug!(sql = %statement.sql, params = statement.params.len(), "execute");
		Ok(self.client.execute(statement.sql.as_str(), &params(statement))?)
	}

	fn batch_execute(&mut self, sql: &str) -> Result<(), DbError> {
		self.begin()?;
		debug!(bytes = sql.len(), "batch execute");
		Ok(self.client.batch_execute(sql)?)
	}

	fn commit(&mut self) -> Result<(), DbError> {
		self.end("COMMIT")
	}

	fn rollback(&mut self) -> Result<(), DbError> {
		self.end("ROLLBACK")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn begins_once_per_transaction() {
		let mut state = TransactionState::default();
		assert!(state.begin());
		assert!(!state.begin());
		assert!(state.end());

		// a commit with nothing open sends nothing
		assert!(!state.end());

		// the next statement after a commit opens a new transaction
		assert!(state.begin());
		assert!(state.end());
	}

	#[test]
	fn autocommit_never_begins() {
		let mut state = TransactionState {
			autocommit: true,
			..TransactionState::default()
		};
		assert!(!state.begin());
		assert!(!state.end());
	}
}
