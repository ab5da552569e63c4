//! One-time setup: create the application database if it does not exist and load its schema
//!
//! Nothing here is transactional and nothing is retried; two processes bootstrapping at once can both see the
//! database as missing, and the loser's `CREATE DATABASE` fails.

use std::{fs, path::Path};

use pg_model_core::Value;
use tracing::info;

use crate::{
	connection::{Connection, PgConnection},
	statement::{quote_ident, Statement},
	DbConfig, DbError,
};

/// Where the schema is read from unless told otherwise, relative to the working directory
pub const DEFAULT_SCHEMA_PATH: &str = "database_config/schema.sql";

/// Database used for the existence check and `CREATE DATABASE`
pub const MAINTENANCE_DATABASE: &str = "postgres";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
	/// The database was created and the schema applied
	Created,
	/// The database was already there; nothing was done
	AlreadyExists,
}

/// Creates `config.name` and applies the schema at `schema_path` if the database does not exist yet
pub fn initialize_database(config: &DbConfig, schema_path: &Path) -> Result<BootstrapOutcome, DbError> {
	initialize_with(&config.name, schema_path, |dbname| {
		Ok(PgConnection::connect(&config.for_database(dbname))?.with_autocommit(true))
	})
}

/// [`initialize_database`] with a caller supplied way of opening autocommit connections to a named database
pub fn initialize_with<C, F>(dbname: &str, schema_path: &Path, mut connect: F) -> Result<BootstrapOutcome, DbError>
where
	C: Connection,
	F: FnMut(&str) -> Result<C, DbError>,
{
	let schema = {
		let mut server = connect(MAINTENANCE_DATABASE)?;
		if database_exists(&mut server, dbname)? {
			info!(dbname, "database already exists");
			return Ok(BootstrapOutcome::AlreadyExists);
		}
		// read before creating, so a missing file does not leave an empty database behind
		let schema = read_schema(schema_path)?;
		create_database(&mut server, dbname)?;
		schema
	};

	let mut database = connect(dbname)?;
	database.batch_execute(&schema)?;
	info!(dbname, schema = %schema_path.display(), "schema applied");
	Ok(BootstrapOutcome::Created)
}

pub fn database_exists<C: Connection>(server: &mut C, dbname: &str) -> Result<bool, DbError> {
	let statement = Statement::new("SELECT 1 FROM pg_database WHERE datname = $1", vec![Value::from(dbname)]);
	Ok(!server.query(&statement)?.is_empty())
}

pub fn create_database<C: Connection>(server: &mut C, dbname: &str) -> Result<(), DbError> {
	server.batch_execute(&format!("CREATE DATABASE {}", quote_ident(dbname)))?;
	info!(dbname, "database created");
	Ok(())
}

fn read_schema(path: &Path) -> Result<String, DbError> {
	fs::read_to_string(path).map_err(|source| DbError::Schema {
		path: path.to_owned(),
		source,
	})
}
