use std::{error::Error, fmt};

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type, WrongType};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Interval, ValueError};

/// A single SQL value, either bound as a statement parameter or decoded from a result column
///
/// Integers and floats are held at their widest width and narrowed to the column type when bound; narrowing that
/// would lose information is reported as an error by the driver instead of silently truncating.
///
/// Enum columns decode as [`Text`](Value::Text) and domains as their base type. Columns of any other type the
/// variants do not cover come back as [`Unknown`](Value::Unknown) so a row never fails to decode as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	/// int2, int4, int8 and oid columns
	Int(i64),
	/// float4 and float8 columns
	Float(f64),
	/// text, varchar, bpchar and name columns
	Text(String),
	Bytes(Vec<u8>),
	Numeric(Decimal),
	Uuid(Uuid),
	Date(NaiveDate),
	Time(NaiveTime),
	Timestamp(NaiveDateTime),
	TimestampTz(DateTime<Utc>),
	Interval(Interval),
	/// json and jsonb columns
	Json(serde_json::Value),
	/// One-dimensional array of any supported element type
	Array(Vec<Value>),
	/// Binary wire form of a column type with no variant of its own; binds back only to the same type
	Unknown { type_name: String, raw: Vec<u8> },
}

impl Value {
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Short name of the variant, used in conversion errors
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "integer",
			Value::Float(_) => "float",
			Value::Text(_) => "text",
			Value::Bytes(_) => "bytes",
			Value::Numeric(_) => "numeric",
			Value::Uuid(_) => "uuid",
			Value::Date(_) => "date",
			Value::Time(_) => "time",
			Value::Timestamp(_) => "timestamp",
			Value::TimestampTz(_) => "timestamptz",
			Value::Interval(_) => "interval",
			Value::Json(_) => "json",
			Value::Array(_) => "array",
			Value::Unknown { .. } => "unknown",
		}
	}

	fn mismatch(&self, expected: &'static str) -> ValueError {
		ValueError::Mismatch {
			expected,
			found: self.kind(),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("NULL"),
			Value::Bool(v) => write!(f, "{}", v),
			Value::Int(v) => write!(f, "{}", v),
			Value::Float(v) => write!(f, "{}", v),
			Value::Text(v) => f.write_str(v),
			Value::Bytes(v) | Value::Unknown { raw: v, .. } => {
				f.write_str("\\x")?;
				v.iter().try_for_each(|b| write!(f, "{:02x}", b))
			},
			Value::Numeric(v) => write!(f, "{}", v),
			Value::Uuid(v) => write!(f, "{}", v),
			Value::Date(v) => write!(f, "{}", v),
			Value::Time(v) => write!(f, "{}", v),
			Value::Timestamp(v) => write!(f, "{}", v),
			Value::TimestampTz(v) => write!(f, "{}", v),
			Value::Interval(v) => write!(f, "{}", v),
			Value::Json(v) => write!(f, "{}", v),
			Value::Array(values) => {
				f.write_str("{")?;
				for (i, v) in values.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{}", v)?;
				}
				f.write_str("}")
			},
		}
	}
}

impl ToSql for Value {
	to_sql_checked!();

	fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
		if let Kind::Domain(base) = ty.kind() {
			return self.to_sql(base, out);
		}
		match self {
			Value::Null => Ok(IsNull::Yes),
			Value::Bool(v) => v.to_sql_checked(ty, out),
			Value::Int(v) => {
				if *ty == Type::INT2 {
					i16::try_from(*v)?.to_sql(ty, out)
				} else if *ty == Type::INT4 {
					i32::try_from(*v)?.to_sql(ty, out)
				} else if *ty == Type::OID {
					u32::try_from(*v)?.to_sql(ty, out)
				} else {
					v.to_sql_checked(ty, out)
				}
			},
			Value::Float(v) => {
				if *ty == Type::FLOAT4 {
					let narrowed = *v as f32;
					if v.is_finite() && !narrowed.is_finite() {
						return Err(format!("{} is out of range for float4", v).into());
					}
					narrowed.to_sql(ty, out)
				} else {
					v.to_sql_checked(ty, out)
				}
			},
			// enum labels travel as their text
			Value::Text(v) if matches!(ty.kind(), Kind::Enum(_)) => {
				out.extend_from_slice(v.as_bytes());
				Ok(IsNull::No)
			},
			Value::Text(v) => v.to_sql_checked(ty, out),
			Value::Bytes(v) => v.to_sql_checked(ty, out),
			Value::Numeric(v) => v.to_sql_checked(ty, out),
			Value::Uuid(v) => v.to_sql_checked(ty, out),
			Value::Date(v) => v.to_sql_checked(ty, out),
			Value::Time(v) => v.to_sql_checked(ty, out),
			Value::Timestamp(v) => v.to_sql_checked(ty, out),
			Value::TimestampTz(v) => v.to_sql_checked(ty, out),
			Value::Interval(v) => v.to_sql_checked(ty, out),
			Value::Json(v) => v.to_sql_checked(ty, out),
			Value::Array(v) => v.to_sql_checked(ty, out),
			Value::Unknown { type_name, raw } if type_name == ty.name() => {
				out.extend_from_slice(raw);
				Ok(IsNull::No)
			},
			Value::Unknown { .. } => Err(Box::new(WrongType::new::<Value>(ty.clone()))),
		}
	}

	// the variant decides; mismatches are reported by the inner to_sql_checked
	fn accepts(_ty: &Type) -> bool {
		true
	}
}

impl<'a> FromSql<'a> for Value {
	fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
		let value = if *ty == Type::BOOL {
			Value::Bool(bool::from_sql(ty, raw)?)
		} else if *ty == Type::INT2 {
			Value::Int(i16::from_sql(ty, raw)?.into())
		} else if *ty == Type::INT4 {
			Value::Int(i32::from_sql(ty, raw)?.into())
		} else if *ty == Type::INT8 {
			Value::Int(i64::from_sql(ty, raw)?)
		} else if *ty == Type::OID {
			Value::Int(u32::from_sql(ty, raw)?.into())
		} else if *ty == Type::FLOAT4 {
			Value::Float(f32::from_sql(ty, raw)?.into())
		} else if *ty == Type::FLOAT8 {
			Value::Float(f64::from_sql(ty, raw)?)
		} else if *ty == Type::BYTEA {
			Value::Bytes(Vec::<u8>::from_sql(ty, raw)?)
		} else if *ty == Type::NUMERIC {
			Value::Numeric(Decimal::from_sql(ty, raw)?)
		} else if *ty == Type::UUID {
			Value::Uuid(Uuid::from_sql(ty, raw)?)
		} else if *ty == Type::DATE {
			Value::Date(NaiveDate::from_sql(ty, raw)?)
		} else if *ty == Type::TIME {
			Value::Time(NaiveTime::from_sql(ty, raw)?)
		} else if *ty == Type::TIMESTAMP {
			Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?)
		} else if *ty == Type::TIMESTAMPTZ {
			Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?)
		} else if *ty == Type::INTERVAL {
			Value::Interval(Interval::from_sql(ty, raw)?)
		} else if *ty == Type::JSON || *ty == Type::JSONB {
			Value::Json(serde_json::Value::from_sql(ty, raw)?)
		} else if <String as FromSql>::accepts(ty) {
			Value::Text(String::from_sql(ty, raw)?)
		} else {
			match ty.kind() {
				Kind::Array(_) => Value::Array(Vec::<Value>::from_sql(ty, raw)?),
				Kind::Enum(_) => Value::Text(std::str::from_utf8(raw)?.to_owned()),
				Kind::Domain(base) => Value::from_sql(base, raw)?,
				_ => Value::Unknown {
					type_name: ty.name().to_owned(),
					raw: raw.to_vec(),
				},
			}
		};
		Ok(value)
	}

	fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
		Ok(Value::Null)
	}

	// anything without a variant of its own decodes as `Unknown`
	fn accepts(_ty: &Type) -> bool {
		true
	}
}

/// Provides `From<$typ> for Value` through the given variant
macro_rules! into_value {
	($typ:ty, $variant:ident) => {
		impl From<$typ> for Value {
			fn from(v: $typ) -> Self {
				Value::$variant(v.into())
			}
		}
	};
}

into_value!(bool, Bool);
into_value!(i16, Int);
into_value!(i32, Int);
into_value!(i64, Int);
into_value!(u32, Int);
into_value!(f32, Float);
into_value!(f64, Float);
into_value!(String, Text);
into_value!(&str, Text);
into_value!(Vec<u8>, Bytes);
into_value!(Decimal, Numeric);
into_value!(Uuid, Uuid);
into_value!(NaiveDate, Date);
into_value!(NaiveTime, Time);
into_value!(NaiveDateTime, Timestamp);
into_value!(DateTime<Utc>, TimestampTz);
into_value!(Interval, Interval);
into_value!(serde_json::Value, Json);
into_value!(Vec<Value>, Array);

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Value::Null, Into::into)
	}
}

/// Converts an owned [`Value`] back into a Rust type. `Option<T>` maps `NULL` to `None`; every other type rejects it
pub trait FromValue: Sized {
	fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl FromValue for Value {
	fn from_value(value: Value) -> Result<Self, ValueError> {
		Ok(value)
	}
}

impl<T: FromValue> FromValue for Option<T> {
	fn from_value(value: Value) -> Result<Self, ValueError> {
		match value {
			Value::Null => Ok(None),
			other => T::from_value(other).map(Some),
		}
	}
}

/// Provides an implementation of [`FromValue`] that only accepts a single variant
macro_rules! from_value {
	($typ:ty, $variant:ident, $expected:literal) => {
		impl FromValue for $typ {
			fn from_value(value: Value) -> Result<Self, ValueError> {
				match value {
					Value::$variant(v) => Ok(v),
					other => Err(other.mismatch($expected)),
				}
			}
		}
	};
}

from_value!(bool, Bool, "bool");
from_value!(i64, Int, "integer");
from_value!(String, Text, "text");
from_value!(Vec<u8>, Bytes, "bytes");
from_value!(Decimal, Numeric, "numeric");
from_value!(Uuid, Uuid, "uuid");
from_value!(NaiveDate, Date, "date");
from_value!(NaiveTime, Time, "time");
from_value!(NaiveDateTime, Timestamp, "timestamp");
from_value!(DateTime<Utc>, TimestampTz, "timestamptz");
from_value!(Interval, Interval, "interval");
from_value!(serde_json::Value, Json, "json");
from_value!(Vec<Value>, Array, "array");

/// Narrowing integer conversions
macro_rules! from_int_value {
	($typ:ty) => {
		impl FromValue for $typ {
			fn from_value(value: Value) -> Result<Self, ValueError> {
				match value {
					Value::Int(v) => <$typ>::try_from(v).map_err(|_| ValueError::OutOfRange {
						value: v,
						target: stringify!($typ),
					}),
					other => Err(other.mismatch("integer")),
				}
			}
		}
	};
}

from_int_value!(i16);
from_int_value!(i32);
from_int_value!(u32);

impl FromValue for f64 {
	fn from_value(value: Value) -> Result<Self, ValueError> {
		match value {
			Value::Float(v) => Ok(v),
			Value::Int(v) => Ok(v as f64),
			other => Err(other.mismatch("float")),
		}
	}
}

impl FromValue for f32 {
	fn from_value(value: Value) -> Result<Self, ValueError> {
		f64::from_value(value).map(|v| v as f32)
	}
}
