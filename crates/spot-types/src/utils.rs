//! Formatting and serialization helpers.

/// Shortens a hash or address for log output.
///
/// Identifiers longer than 8 characters are cut to their first 8 characters
/// followed by `..`.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Serde adapter that writes `u64` as a decimal string and reads either a
/// string or a JSON number.
///
/// Use with `#[serde(with = "crate::utils::serde_decimal")]`.
pub mod serde_decimal {
	use serde::{de, Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(value)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Repr {
			Text(String),
			Number(u64),
		}

		match Repr::deserialize(deserializer)? {
			Repr::Number(n) => Ok(n),
			Repr::Text(s) => s.trim().parse::<u64>().map_err(de::Error::custom),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::{Deserialize, Serialize};

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("abc"), "abc");
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("GABCDEFGHIJK"), "GABCDEFG..");
	}

	#[derive(Serialize, Deserialize, PartialEq, Debug)]
	struct Wrapper {
		#[serde(with = "serde_decimal")]
		value: u64,
	}

	#[test]
	fn test_serde_decimal_accepts_both_forms() {
		let w = Wrapper { value: u64::MAX };
		let json = serde_json::to_string(&w).unwrap();
		assert_eq!(json, r#"{"value":"18446744073709551615"}"#);
		assert_eq!(serde_json::from_str::<Wrapper>(&json).unwrap(), w);
		assert_eq!(
			serde_json::from_str::<Wrapper>(r#"{"value":42}"#).unwrap(),
			Wrapper { value: 42 }
		);
		assert!(serde_json::from_str::<Wrapper>(r#"{"value":"x"}"#).is_err());
	}
}
