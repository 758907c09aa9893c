//! Native value to `ScVal` encoding.

use crate::CodecError;
use spot_types::{NativeValue, TypedArg, ValueKind};
use stellar_strkey::Strkey;
use stellar_xdr::curr::{
	AccountId, ContractId, Hash, PublicKey, ScAddress, ScString, ScSymbol, ScVal, Uint256,
};

/// Encodes a native value as the given kind.
///
/// `U64` accepts a native `u64` or a decimal string; the string is parsed
/// exactly and never goes through a float.
pub fn encode(value: &NativeValue, kind: ValueKind) -> Result<ScVal, CodecError> {
	match (kind, value) {
		(ValueKind::Address, NativeValue::Address(s) | NativeValue::String(s)) => {
			Ok(ScVal::Address(address_to_sc(s)?))
		},
		(ValueKind::String, NativeValue::String(s)) => {
			let text = s.as_str().try_into()?;
			Ok(ScVal::String(ScString(text)))
		},
		(ValueKind::U32, NativeValue::U32(n)) => Ok(ScVal::U32(*n)),
		(ValueKind::U32, NativeValue::String(s)) => s
			.trim()
			.parse::<u32>()
			.map(ScVal::U32)
			.map_err(|_| CodecError::InvalidInteger { kind, value: s.clone() }),
		(ValueKind::U64, NativeValue::U64(n)) => Ok(ScVal::U64(*n)),
		(ValueKind::U64, NativeValue::U32(n)) => Ok(ScVal::U64(u64::from(*n))),
		(ValueKind::U64, NativeValue::String(s)) => s
			.trim()
			.parse::<u64>()
			.map(ScVal::U64)
			.map_err(|_| CodecError::InvalidInteger { kind, value: s.clone() }),
		(ValueKind::Bool, NativeValue::Bool(b)) => Ok(ScVal::Bool(*b)),
		(kind, other) => Err(CodecError::KindMismatch {
			kind,
			observed: other.kind_name().to_string(),
		}),
	}
}

/// Encodes an ordered argument list.
pub fn encode_args(args: &[TypedArg]) -> Result<Vec<ScVal>, CodecError> {
	args.iter().map(|arg| encode(&arg.value, arg.kind)).collect()
}

/// Parses a strkey into an `ScAddress`.
///
/// `G...` maps to an account address and `C...` to a contract address.
pub fn address_to_sc(address: &str) -> Result<ScAddress, CodecError> {
	match Strkey::from_string(address) {
		Ok(Strkey::PublicKeyEd25519(pk)) => Ok(ScAddress::Account(AccountId(
			PublicKey::PublicKeyTypeEd25519(Uint256(pk.0)),
		))),
		Ok(Strkey::Contract(contract)) => Ok(ScAddress::Contract(ContractId(Hash(contract.0)))),
		_ => Err(CodecError::InvalidAddress(address.to_string())),
	}
}

/// Builds a contract symbol, such as a method name.
pub fn symbol(name: &str) -> Result<ScSymbol, CodecError> {
	Ok(ScSymbol(name.try_into()?))
}
