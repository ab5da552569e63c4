use std::collections::{BTreeMap, HashMap};

use crate::{Record, Value};

/// Anything that can hand out column values by name, such as the output of a document parser
///
/// Used by [`Model::from_source`](crate::Model::from_source); returning `None` means the source has no such field.
pub trait RecordSource {
	fn field(&self, column: &str) -> Option<Value>;
}

impl RecordSource for Record {
	fn field(&self, column: &str) -> Option<Value> {
		self.get(column).cloned()
	}
}

impl RecordSource for HashMap<String, Value> {
	fn field(&self, column: &str) -> Option<Value> {
		self.get(column).cloned()
	}
}

impl RecordSource for BTreeMap<String, Value> {
	fn field(&self, column: &str) -> Option<Value> {
		self.get(column).cloned()
	}
}

/// JSON objects map scalars onto the matching variant; nested arrays and objects stay JSON
impl RecordSource for serde_json::Map<String, serde_json::Value> {
	fn field(&self, column: &str) -> Option<Value> {
		use serde_json::Value as Json;

		let value = match self.get(column)? {
			Json::Null => Value::Null,
			Json::Bool(b) => Value::Bool(*b),
			Json::Number(n) => match n.as_i64() {
				Some(i) => Value::Int(i),
				None => Value::Float(n.as_f64()?),
			},
			Json::String(s) => Value::Text(s.clone()),
			nested => Value::Json(nested.clone()),
		};
		Some(value)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn json_objects_map_scalars() {
		let parsed = json!({
			"title": "Report",
			"pages": 12,
			"score": 0.5,
			"draft": false,
			"tags": ["a", "b"],
			"author": null,
		});
		let object = parsed.as_object().unwrap();

		assert_eq!(object.field("title"), Some(Value::from("Report")));
		assert_eq!(object.field("pages"), Some(Value::Int(12)));
		assert_eq!(object.field("score"), Some(Value::Float(0.5)));
		assert_eq!(object.field("draft"), Some(Value::Bool(false)));
		assert_eq!(object.field("tags"), Some(Value::Json(json!(["a", "b"]))));
		assert_eq!(object.field("author"), Some(Value::Null));
		assert_eq!(object.field("missing"), None);
	}
}
