//! Projection of struct-shaped contract values onto typed records.
//!
//! Contract structs arrive as symbol-keyed maps. Unknown keys are ignored
//! and missing keys take the field type's zero value, so records keep
//! decoding when the contract adds or drops fields. A key that is present
//! with the wrong variant is still a decode error.

use crate::{decode::decode, CodecError};
use spot_types::{CreatorApproval, EventRecord, NativeValue};
use stellar_xdr::curr::ScVal;

/// Field lookup over a decoded map.
pub struct FieldMap {
	entries: Vec<(String, NativeValue)>,
}

impl FieldMap {
	/// Builds a field map from a decoded value, which must be a map.
	pub fn from_native(value: NativeValue) -> Result<Self, CodecError> {
		match value {
			NativeValue::Map(entries) => Ok(Self { entries }),
			other => Err(CodecError::Decode {
				expected: "map".to_string(),
				observed: other.kind_name().to_string(),
			}),
		}
	}

	fn get(&self, key: &str) -> Option<&NativeValue> {
		self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	fn mismatch(key: &str, expected: &str, value: &NativeValue) -> CodecError {
		CodecError::Decode {
			expected: format!("{} for field '{}'", expected, key),
			observed: value.kind_name().to_string(),
		}
	}

	pub fn string(&self, key: &str) -> Result<String, CodecError> {
		match self.get(key) {
			None | Some(NativeValue::Void) => Ok(String::new()),
			Some(NativeValue::String(s)) => Ok(s.clone()),
			Some(other) => Err(Self::mismatch(key, "string", other)),
		}
	}

	/// Address field as strkey text. Plain strings are accepted as well.
	pub fn address(&self, key: &str) -> Result<String, CodecError> {
		match self.get(key) {
			None | Some(NativeValue::Void) => Ok(String::new()),
			Some(NativeValue::Address(s) | NativeValue::String(s)) => Ok(s.clone()),
			Some(other) => Err(Self::mismatch(key, "address", other)),
		}
	}

	pub fn u32(&self, key: &str) -> Result<u32, CodecError> {
		match self.get(key) {
			None | Some(NativeValue::Void) => Ok(0),
			Some(NativeValue::U32(n)) => Ok(*n),
			Some(other) => Err(Self::mismatch(key, "u32", other)),
		}
	}

	pub fn u64(&self, key: &str) -> Result<u64, CodecError> {
		match self.get(key) {
			None | Some(NativeValue::Void) => Ok(0),
			Some(NativeValue::U64(n)) => Ok(*n),
			Some(NativeValue::U32(n)) => Ok(u64::from(*n)),
			Some(other) => Err(Self::mismatch(key, "u64", other)),
		}
	}
}

/// A record that can be projected from a contract struct value.
pub trait DecodeRecord: Sized {
	fn from_fields(fields: &FieldMap) -> Result<Self, CodecError>;

	/// Decodes the record from a contract map value.
	fn decode_record(value: &ScVal) -> Result<Self, CodecError> {
		let fields = FieldMap::from_native(decode(value)?)?;
		Self::from_fields(&fields)
	}

	/// Decodes an `Option<Record>` return value, where `None` is void.
	fn decode_optional(value: &ScVal) -> Result<Option<Self>, CodecError> {
		match value {
			ScVal::Void => Ok(None),
			other => Self::decode_record(other).map(Some),
		}
	}
}

impl DecodeRecord for EventRecord {
	fn from_fields(fields: &FieldMap) -> Result<Self, CodecError> {
		Ok(EventRecord {
			event_id: fields.u32("event_id")?,
			creator: fields.address("creator")?,
			event_name: fields.string("event_name")?,
			event_date: fields.u64("event_date")?,
			location: fields.string("location")?,
			description: fields.string("description")?,
			max_poaps: fields.u32("max_poaps")?,
			claim_start: fields.u64("claim_start")?,
			claim_end: fields.u64("claim_end")?,
			metadata_uri: fields.string("metadata_uri")?,
			image_url: fields.string("image_url")?,
		})
	}
}

impl DecodeRecord for CreatorApproval {
	fn from_fields(fields: &FieldMap) -> Result<Self, CodecError> {
		Ok(CreatorApproval {
			payment_reference: fields.string("payment_reference")?,
			approved_at: fields.u64("approved_at")?,
			approved_by: fields.address("approved_by")?,
		})
	}
}
