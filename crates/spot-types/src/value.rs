//! Native representation of decoded contract values.

use serde_json::{json, Value};

/// A contract value decoded into plain Rust data.
///
/// Maps keep the entry order of the wire value. 64-bit integers are kept as
/// `u64`/`i64` and rendered as decimal strings in JSON so that consumers
/// with float-backed numbers never lose precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
	/// Unit / absent value (`()` or `None` on the contract side).
	Void,
	Bool(bool),
	U32(u32),
	I32(i32),
	U64(u64),
	I64(i64),
	/// Text value (contract `String` or `Symbol`).
	String(String),
	/// Strkey-encoded address (`G...` account or `C...` contract).
	Address(String),
	/// Raw bytes.
	Bytes(Vec<u8>),
	Vec(Vec<NativeValue>),
	/// Ordered key/value entries of a struct or map.
	Map(Vec<(String, NativeValue)>),
}

impl NativeValue {
	/// Short name of the variant, used in decode error messages.
	pub fn kind_name(&self) -> &'static str {
		match self {
			NativeValue::Void => "void",
			NativeValue::Bool(_) => "bool",
			NativeValue::U32(_) => "u32",
			NativeValue::I32(_) => "i32",
			NativeValue::U64(_) => "u64",
			NativeValue::I64(_) => "i64",
			NativeValue::String(_) => "string",
			NativeValue::Address(_) => "address",
			NativeValue::Bytes(_) => "bytes",
			NativeValue::Vec(_) => "vec",
			NativeValue::Map(_) => "map",
		}
	}

	/// Converts the value into JSON for display and API responses.
	///
	/// 64-bit integers become decimal strings.
	pub fn to_json(&self) -> Value {
		match self {
			NativeValue::Void => Value::Null,
			NativeValue::Bool(b) => json!(b),
			NativeValue::U32(n) => json!(n),
			NativeValue::I32(n) => json!(n),
			NativeValue::U64(n) => json!(n.to_string()),
			NativeValue::I64(n) => json!(n.to_string()),
			NativeValue::String(s) | NativeValue::Address(s) => json!(s),
			NativeValue::Bytes(bytes) => {
				json!(bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>())
			},
			NativeValue::Vec(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
			NativeValue::Map(entries) => {
				let mut map = serde_json::Map::with_capacity(entries.len());
				for (key, value) in entries {
					map.insert(key.clone(), value.to_json());
				}
				Value::Object(map)
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_u64_json_is_exact_decimal_string() {
		let value = NativeValue::U64(u64::MAX);
		assert_eq!(value.to_json(), json!("18446744073709551615"));
	}

	#[test]
	fn test_map_json_keeps_keys() {
		let value = NativeValue::Map(vec![
			("event_id".to_string(), NativeValue::U32(7)),
			("creator".to_string(), NativeValue::Address("GABC".to_string())),
		]);
		let json = value.to_json();
		assert_eq!(json["event_id"], 7);
		assert_eq!(json["creator"], "GABC");
	}
}
