use std::{path::PathBuf, process};

use pg_model::{
	bootstrap::{self, BootstrapOutcome, DEFAULT_SCHEMA_PATH},
	Columns, ConfigOverrides, Database, DbConfig, DbError, Predicate,
};
use structopt::StructOpt;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(name = "pg_model", about = "Bootstrap and inspect a PostgreSQL database")]
struct Opt {
	#[structopt(flatten)]
	connection: ConfigOverrides,
	#[structopt(subcommand)]
	command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
	/// Create the database and apply the schema if it does not exist yet
	Init {
		/// SQL file to run after creating the database
		#[structopt(long, parse(from_os_str), default_value = DEFAULT_SCHEMA_PATH)]
		schema: PathBuf,
	},
	/// Print rows of a table
	Select {
		table: String,
		/// Column to print (repeatable); all columns when omitted
		#[structopt(long = "column", short = "c")]
		columns: Vec<String>,
		/// Equality filter as column=value (repeatable); values are compared as text
		#[structopt(long = "where", short = "w", parse(try_from_str = parse_condition))]
		conditions: Vec<(String, String)>,
	},
}

fn parse_condition(s: &str) -> Result<(String, String), String> {
	match s.split_once('=') {
		Some((column, value)) if !column.is_empty() => Ok((column.to_owned(), value.to_owned())),
		_ => Err(format!("expected column=value, got `{}`", s)),
	}
}

fn run(opt: Opt) -> Result<(), DbError> {
	let config = DbConfig::load(&opt.connection)?;
	match opt.command {
		Command::Init { schema } => match bootstrap::initialize_database(&config, &schema)? {
			BootstrapOutcome::Created => println!("Database {} created and schema applied", config.name),
			BootstrapOutcome::AlreadyExists => println!("Database {} already exists", config.name),
		},
		Command::Select {
			table,
			columns,
			conditions,
		} => {
			let columns = if columns.is_empty() { Columns::All } else { Columns::List(columns) };
			let predicate = conditions
				.into_iter()
				.fold(Predicate::new(), |predicate, (column, value)| predicate.equal(column, value));

			let mut db = Database::new(config);
			let records = db.select_records(&table, &columns, &predicate)?;
			for record in &records {
				print!("{}", record.display(&table));
			}
			println!("{} row(s)", records.len());
			db.close();
		},
	}
	Ok(())
}

fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();

	let opt = Opt::from_args();
	if let Err(e) = run(opt) {
		error!(error = %e, "pg_model failed");
		process::exit(1);
	}
}
