//! Typed views of the SPOT contract's records.
//!
//! The contract returns its structs as symbol-keyed maps. The codec
//! projects those maps onto the records below; 64-bit fields are carried as
//! `u64` and serialized as decimal strings.

use crate::utils::serde_decimal;
use serde::{Deserialize, Serialize};

/// An event as stored by the contract (`get_event`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
	pub event_id: u32,
	pub creator: String,
	pub event_name: String,
	#[serde(with = "serde_decimal")]
	pub event_date: u64,
	pub location: String,
	pub description: String,
	pub max_poaps: u32,
	#[serde(with = "serde_decimal")]
	pub claim_start: u64,
	#[serde(with = "serde_decimal")]
	pub claim_end: u64,
	pub metadata_uri: String,
	pub image_url: String,
}

/// Arguments of `create_event`, in the order the contract declares them
/// after `creator`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
	pub event_name: String,
	#[serde(with = "serde_decimal")]
	pub event_date: u64,
	pub location: String,
	pub description: String,
	pub max_poaps: u32,
	#[serde(with = "serde_decimal")]
	pub claim_start: u64,
	#[serde(with = "serde_decimal")]
	pub claim_end: u64,
	pub metadata_uri: String,
	pub image_url: String,
}

/// Creator approval granted by the contract admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorApproval {
	pub payment_reference: String,
	#[serde(with = "serde_decimal")]
	pub approved_at: u64,
	pub approved_by: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_record_serializes_u64_as_string() {
		let event = EventRecord {
			event_id: 1,
			event_date: 1_700_000_000,
			claim_start: 1,
			claim_end: u64::MAX,
			..Default::default()
		};
		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["event_id"], 1);
		assert_eq!(json["event_date"], "1700000000");
		assert_eq!(json["claim_end"], "18446744073709551615");
	}
}
