use std::{error::Error, fmt};

use bytes::BytesMut;
use postgres_types::{to_sql_checked, FromSql, IsNull, ToSql, Type};

/// A SQL `interval`, held in the three units the server stores so nothing is lost converting back and forth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interval {
	pub months: i32,
	pub days: i32,
	pub microseconds: i64,
}

impl Interval {
	pub fn new(months: i32, days: i32, microseconds: i64) -> Self {
		Interval {
			months,
			days,
			microseconds,
		}
	}
}

/// ISO 8601 duration, e.g. `P1M2DT3.000000S`
impl fmt::Display for Interval {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let sign = if self.microseconds < 0 { "-" } else { "" };
		let micros = self.microseconds.unsigned_abs();
		write!(
			f,
			"P{}M{}DT{}{}.{:06}S",
			self.months,
			self.days,
			sign,
			micros / 1_000_000,
			micros % 1_000_000
		)
	}
}

impl FromSql<'_> for Interval {
	fn from_sql(_ty: &Type, raw: &[u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
		if raw.len() != 16 {
			return Err(format!("invalid interval of {} bytes", raw.len()).into());
		}
		let (microseconds, rest) = raw.split_at(8);
		let (days, months) = rest.split_at(4);
		Ok(Interval {
			months: i32::from_be_bytes(months.try_into()?),
			days: i32::from_be_bytes(days.try_into()?),
			microseconds: i64::from_be_bytes(microseconds.try_into()?),
		})
	}

	fn accepts(ty: &Type) -> bool {
		*ty == Type::INTERVAL
	}
}

impl ToSql for Interval {
	to_sql_checked!();

	fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
		out.extend_from_slice(&self.microseconds.to_be_bytes());
		out.extend_from_slice(&self.days.to_be_bytes());
		out.extend_from_slice(&self.months.to_be_bytes());
		Ok(IsNull::No)
	}

	fn accepts(ty: &Type) -> bool {
		*ty == Type::INTERVAL
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_layout() {
		let mut raw = Vec::new();
		raw.extend_from_slice(&1_500_000i64.to_be_bytes());
		raw.extend_from_slice(&2i32.to_be_bytes());
		raw.extend_from_slice(&14i32.to_be_bytes());

		let interval = Interval::from_sql(&Type::INTERVAL, &raw).unwrap();
		assert_eq!(interval, Interval::new(14, 2, 1_500_000));

		let mut out = BytesMut::new();
		interval.to_sql_checked(&Type::INTERVAL, &mut out).unwrap();
		assert_eq!(&out[..], &raw[..]);
	}

	#[test]
	fn short_input_is_an_error() {
		assert!(Interval::from_sql(&Type::INTERVAL, &[0; 8]).is_err());
	}

	#[test]
	fn display() {
		assert_eq!(Interval::new(1, 2, 3_000_001).to_string(), "P1M2DT3.000001S");
		assert_eq!(Interval::new(0, 0, -500_000).to_string(), "P0M0DT-0.500000S");
	}
}
