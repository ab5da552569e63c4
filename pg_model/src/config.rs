//! Connection settings shared by [`Database`](crate::Database) and the bootstrap routine
//!
//! Settings come from the environment (`DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`), after loading a
//! `.env` file if one exists. Command line flags override individual values.

use std::collections::HashMap;

use serde::Deserialize;
use structopt::StructOpt;
use tracing::{debug, warn};

use crate::DbError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
	/// Database to connect to
	pub name: String,
	#[serde(default = "default_user")]
	pub user: String,
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
}

fn default_user() -> String {
	"postgres".to_owned()
}

fn default_host() -> String {
	"localhost".to_owned()
}

fn default_port() -> u16 {
	5432
}

/// Flags that take precedence over the environment
#[derive(Debug, Clone, Default, StructOpt)]
pub struct ConfigOverrides {
	/// Database server host
	#[structopt(long)]
	pub host: Option<String>,
	/// Database server port
	#[structopt(long)]
	pub port: Option<u16>,
	/// User to connect as
	#[structopt(long, short)]
	pub user: Option<String>,
	/// Password for the user
	#[structopt(long)]
	pub password: Option<String>,
	/// Name of the database
	#[structopt(long, short = "d")]
	pub dbname: Option<String>,
}

const ENV_PREFIX: &str = "DB";

impl DbConfig {
	/// Reads `.env` (if present) and the process environment
	pub fn from_env() -> Result<Self, DbError> {
		Self::load(&ConfigOverrides::default())
	}

	/// Like [`from_env`](Self::from_env) with `overrides` applied on top
	pub fn load(overrides: &ConfigOverrides) -> Result<Self, DbError> {
		match dotenvy::dotenv() {
			Ok(path) => debug!(path = %path.display(), "loaded .env"),
			Err(e) if e.not_found() => {},
			Err(e) => warn!(error = %e, "ignoring unreadable .env file"),
		}
		Self::build(::config::Environment::with_prefix(ENV_PREFIX), overrides)
	}

	/// Loads from an explicit variable map instead of the process environment
	pub fn from_vars(vars: HashMap<String, String>, overrides: &ConfigOverrides) -> Result<Self, DbError> {
		Self::build(::config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)), overrides)
	}

	fn build(env: ::config::Environment, overrides: &ConfigOverrides) -> Result<Self, DbError> {
		let config = ::config::Config::builder()
			.add_source(env)
			.set_override_option("host", overrides.host.clone())?
			.set_override_option("port", overrides.port.map(i64::from))?
			.set_override_option("user", overrides.user.clone())?
			.set_override_option("password", overrides.password.clone())?
			.set_override_option("name", overrides.dbname.clone())?
			.build()?;
		Ok(config.try_deserialize()?)
	}

	/// Same server and credentials, different database
	pub fn for_database(&self, name: &str) -> Self {
		DbConfig {
			name: name.to_owned(),
			..self.clone()
		}
	}

	pub fn to_pg_config(&self) -> postgres::Config {
		let mut config = postgres::Config::new();
		config.host(&self.host).port(self.port).user(&self.user).dbname(&self.name);
		if let Some(password) = &self.password {
			config.password(password);
		}
		config
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn reads_prefixed_variables() {
		let config = DbConfig::from_vars(
			vars(&[
				("DB_NAME", "library"),
				("DB_USER", "reader"),
				("DB_PASSWORD", "1234"),
				("DB_HOST", "db.internal"),
				("DB_PORT", "6543"),
			]),
			&ConfigOverrides::default(),
		)
		.unwrap();
		assert_eq!(
			config,
			DbConfig {
				name: "library".to_owned(),
				user: "reader".to_owned(),
				password: Some("1234".to_owned()),
				host: "db.internal".to_owned(),
				port: 6543,
			}
		);
	}

	#[test]
	fn defaults_and_overrides() {
		let overrides = ConfigOverrides {
			port: Some(15432),
			dbname: Some("scratch".to_owned()),
			..ConfigOverrides::default()
		};
		let config = DbConfig::from_vars(vars(&[("DB_NAME", "library")]), &overrides).unwrap();
		assert_eq!(config.name, "scratch");
		assert_eq!(config.port, 15432);
		assert_eq!(config.host, "localhost");
		assert_eq!(config.user, "postgres");
		assert_eq!(config.password, None);
	}

	#[test]
	fn name_is_required() {
		let err = DbConfig::from_vars(vars(&[("DB_HOST", "db")]), &ConfigOverrides::default()).unwrap_err();
		assert!(matches!(err, DbError::Config(_)));
	}

	#[test]
	fn for_database_keeps_credentials() {
		let config = DbConfig::from_vars(vars(&[("DB_NAME", "library"), ("DB_USER", "reader")]), &ConfigOverrides::default())
			.unwrap()
			.for_database("postgres");
		assert_eq!(config.name, "postgres");
		assert_eq!(config.user, "reader");
	}
}
