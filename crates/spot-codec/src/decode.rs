//! `ScVal` to native value decoding.

use crate::CodecError;
use spot_types::{NativeValue, ValueKind};
use stellar_xdr::curr::{Limits, ReadXdr, ScAddress, ScVal, StringM};

/// Decodes any supported `ScVal` into a [`NativeValue`].
///
/// Integer widths, timepoints and durations are decoded generically so a
/// change of scalar width in the contract does not break callers. Variants
/// with no native counterpart fail with [`CodecError::Decode`].
pub fn decode(value: &ScVal) -> Result<NativeValue, CodecError> {
	match value {
		ScVal::Void => Ok(NativeValue::Void),
		ScVal::Bool(b) => Ok(NativeValue::Bool(*b)),
		ScVal::U32(n) => Ok(NativeValue::U32(*n)),
		ScVal::I32(n) => Ok(NativeValue::I32(*n)),
		ScVal::U64(n) => Ok(NativeValue::U64(*n)),
		ScVal::I64(n) => Ok(NativeValue::I64(*n)),
		ScVal::Timepoint(t) => Ok(NativeValue::U64(t.0)),
		ScVal::Duration(d) => Ok(NativeValue::U64(d.0)),
		ScVal::String(s) => utf8(&s.0).map(NativeValue::String),
		ScVal::Symbol(s) => utf8(&s.0).map(NativeValue::String),
		ScVal::Bytes(b) => Ok(NativeValue::Bytes(b.0.to_vec())),
		ScVal::Address(address) => sc_address_to_string(address).map(NativeValue::Address),
		ScVal::Vec(None) => Ok(NativeValue::Vec(Vec::new())),
		ScVal::Vec(Some(items)) => items
			.0
			.iter()
			.map(decode)
			.collect::<Result<Vec<_>, _>>()
			.map(NativeValue::Vec),
		ScVal::Map(None) => Ok(NativeValue::Map(Vec::new())),
		ScVal::Map(Some(entries)) => {
			let mut fields = Vec::with_capacity(entries.0.len());
			for entry in entries.0.iter() {
				let key = match &entry.key {
					ScVal::Symbol(s) => utf8(&s.0)?,
					ScVal::String(s) => utf8(&s.0)?,
					other => {
						return Err(CodecError::Decode {
							expected: "symbol or string map key".to_string(),
							observed: observed(other),
						})
					},
				};
				fields.push((key, decode(&entry.val)?));
			}
			Ok(NativeValue::Map(fields))
		},
		other => Err(CodecError::Decode {
			expected: "supported value".to_string(),
			observed: observed(other),
		}),
	}
}

/// Decodes a value that must carry the variant of `kind`.
///
/// `U64` also accepts timepoints and durations, and `String` accepts
/// symbols.
pub fn decode_as(value: &ScVal, kind: ValueKind) -> Result<NativeValue, CodecError> {
	let matches = matches!(
		(kind, value),
		(ValueKind::Address, ScVal::Address(_))
			| (ValueKind::String, ScVal::String(_) | ScVal::Symbol(_))
			| (ValueKind::U32, ScVal::U32(_))
			| (ValueKind::U64, ScVal::U64(_) | ScVal::Timepoint(_) | ScVal::Duration(_))
			| (ValueKind::Bool, ScVal::Bool(_))
	);
	if !matches {
		return Err(CodecError::Decode {
			expected: kind.to_string(),
			observed: observed(value),
		});
	}
	decode(value)
}

/// Decodes a vector of `u32`, such as a list of event ids.
///
/// A void value decodes to an empty list.
pub fn decode_u32_vec(value: &ScVal) -> Result<Vec<u32>, CodecError> {
	match value {
		ScVal::Void | ScVal::Vec(None) => Ok(Vec::new()),
		ScVal::Vec(Some(items)) => items
			.0
			.iter()
			.map(|item| match item {
				ScVal::U32(n) => Ok(*n),
				other => Err(CodecError::Decode {
					expected: "u32".to_string(),
					observed: observed(other),
				}),
			})
			.collect(),
		other => Err(CodecError::Decode {
			expected: "vec".to_string(),
			observed: observed(other),
		}),
	}
}

/// Parses a base64 XDR `ScVal`, as returned by simulation results.
pub fn decode_base64(xdr: &str) -> Result<ScVal, CodecError> {
	Ok(ScVal::from_xdr_base64(xdr, Limits::none())?)
}

pub(crate) fn sc_address_to_string(address: &ScAddress) -> Result<String, CodecError> {
	match address {
		ScAddress::Account(account) => {
			let stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(key) = &account.0;
			Ok(format!("{}", stellar_strkey::ed25519::PublicKey(key.0)))
		},
		ScAddress::Contract(contract) => {
			Ok(format!("{}", stellar_strkey::Contract((contract.0).0)))
		},
		other => Err(CodecError::Decode {
			expected: "account or contract address".to_string(),
			observed: format!("{:?}", other.discriminant()),
		}),
	}
}

fn utf8<const MAX: u32>(text: &StringM<MAX>) -> Result<String, CodecError> {
	text.to_utf8_string().map_err(|_| CodecError::Decode {
		expected: "utf-8 text".to_string(),
		observed: "invalid utf-8".to_string(),
	})
}

fn observed(value: &ScVal) -> String {
	format!("{:?}", value.discriminant())
}
