//! Structured value codec for Soroban contract calls.
//!
//! Converts typed call arguments into `ScVal` and decodes `ScVal` return
//! values back into [`NativeValue`] or typed records. The codec is pure:
//! it performs no I/O and holds no state.

use thiserror::Error;

mod decode;
mod encode;
mod record;

pub use decode::{decode, decode_as, decode_base64, decode_u32_vec};
pub use encode::{address_to_sc, encode, encode_args, symbol};
pub use record::{DecodeRecord, FieldMap};

pub use spot_types::{NativeValue, ValueKind};

/// Errors raised while converting between native values and `ScVal`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
	/// The value did not carry the variant tag the caller expected.
	#[error("Decode error: expected {expected}, observed {observed}")]
	Decode {
		expected: String,
		observed: String,
	},
	/// Address string is neither a `G...` account nor a `C...` contract.
	#[error("Invalid address: {0}")]
	InvalidAddress(String),
	/// Integer text could not be parsed exactly.
	#[error("Invalid integer for {kind}: {value}")]
	InvalidInteger { kind: ValueKind, value: String },
	/// The native value cannot be encoded as the declared kind.
	#[error("Cannot encode {observed} as {kind}")]
	KindMismatch { kind: ValueKind, observed: String },
	/// XDR length limits or serialization failures.
	#[error("XDR error: {0}")]
	Xdr(String),
}

impl From<stellar_xdr::curr::Error> for CodecError {
	fn from(e: stellar_xdr::curr::Error) -> Self {
		CodecError::Xdr(e.to_string())
	}
}
