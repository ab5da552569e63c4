#![allow(dead_code)]

use std::{
	collections::VecDeque,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc, Mutex,
	},
};

use pg_model::{Connection, Database, DbError, Record, Statement};

/// What a [`ScriptedConnection`] saw, plus the answers it will give
#[derive(Default)]
pub struct Script {
	pub statements: Vec<Statement>,
	pub batches: Vec<String>,
	pub commits: usize,
	pub rollbacks: usize,
	/// Answers for `query`, in order; an empty queue answers with no rows
	pub rows: VecDeque<Result<Vec<Record>, String>>,
	/// Answers for `execute`, in order; an empty queue answers 0
	pub affected: VecDeque<u64>,
}

pub struct ScriptedConnection(pub Arc<Mutex<Script>>);

impl Connection for ScriptedConnection {
	fn query(&mut self, statement: &Statement) -> Result<Vec<Record>, DbError> {
		let mut script = self.0.lock().unwrap();
		script.statements.push(statement.clone());
		match script.rows.pop_front() {
			Some(Ok(rows)) => Ok(rows),
			Some(Err(message)) => Err(DbError::Query(message.into())),
			None => Ok(Vec::new()),
		}
	}

	fn execute(&mut self, statement: &Statement) -> Result<u64, DbError> {
		let mut script = self.0.lock().unwrap();
		script.statements.push(statement.clone());
		Ok(script.affected.pop_front().unwrap_or(0))
	}

	fn batch_execute(&mut self, sql: &str) -> Result<(), DbError> {
		self.0.lock().unwrap().batches.push(sql.to_owned());
		Ok(())
	}

	fn commit(&mut self) -> Result<(), DbError> {
		self.0.lock().unwrap().commits += 1;
		Ok(())
	}

	fn rollback(&mut self) -> Result<(), DbError> {
		self.0.lock().unwrap().rollbacks += 1;
		Ok(())
	}
}

/// A lazily connecting database over a fresh script, and a counter of how often it connected
pub fn scripted() -> (Database<ScriptedConnection>, Arc<Mutex<Script>>, Arc<AtomicUsize>) {
	let script = Arc::new(Mutex::new(Script::default()));
	let connects = Arc::new(AtomicUsize::new(0));
	let db = {
		let script = Arc::clone(&script);
		let connects = Arc::clone(&connects);
		Database::with_connector(move || {
			connects.fetch_add(1, Ordering::SeqCst);
			Ok(ScriptedConnection(Arc::clone(&script)))
		})
	};
	(db, script, connects)
}
