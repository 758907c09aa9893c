//! Contract call specification types.
//!
//! A [`ContractCallSpec`] names the contract, the method and the ordered,
//! typed arguments of one invocation. It is built per call and consumed by
//! the transaction builder.

use crate::value::NativeValue;
use std::fmt;

/// Declared kind of a contract argument.
///
/// The kind decides how the codec encodes the accompanying native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	Address,
	String,
	U32,
	/// 64-bit unsigned; accepts a native `u64` or a decimal string.
	U64,
	Bool,
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ValueKind::Address => "address",
			ValueKind::String => "string",
			ValueKind::U32 => "u32",
			ValueKind::U64 => "u64",
			ValueKind::Bool => "bool",
		};
		f.write_str(name)
	}
}

/// A native value paired with the kind it must be encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedArg {
	pub kind: ValueKind,
	pub value: NativeValue,
}

impl TypedArg {
	pub fn new(kind: ValueKind, value: NativeValue) -> Self {
		Self { kind, value }
	}

	/// Strkey address argument (`G...` or `C...`).
	pub fn address(address: impl Into<String>) -> Self {
		Self::new(ValueKind::Address, NativeValue::Address(address.into()))
	}

	pub fn string(value: impl Into<String>) -> Self {
		Self::new(ValueKind::String, NativeValue::String(value.into()))
	}

	pub fn u32(value: u32) -> Self {
		Self::new(ValueKind::U32, NativeValue::U32(value))
	}

	pub fn u64(value: u64) -> Self {
		Self::new(ValueKind::U64, NativeValue::U64(value))
	}

	/// 64-bit argument given as a decimal string, parsed exactly at encode time.
	pub fn u64_decimal(value: impl Into<String>) -> Self {
		Self::new(ValueKind::U64, NativeValue::String(value.into()))
	}

	pub fn bool(value: bool) -> Self {
		Self::new(ValueKind::Bool, NativeValue::Bool(value))
	}
}

/// Immutable description of a single contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallSpec {
	/// Contract address (`C...`).
	pub contract_id: String,
	/// Contract method name.
	pub method: String,
	/// Ordered, typed arguments.
	pub args: Vec<TypedArg>,
}

impl ContractCallSpec {
	pub fn new(contract_id: impl Into<String>, method: impl Into<String>) -> Self {
		Self {
			contract_id: contract_id.into(),
			method: method.into(),
			args: Vec::new(),
		}
	}

	/// Appends an argument, keeping declaration order.
	pub fn arg(mut self, arg: TypedArg) -> Self {
		self.args.push(arg);
		self
	}

	pub fn with_args(mut self, args: impl IntoIterator<Item = TypedArg>) -> Self {
		self.args.extend(args);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_builder_keeps_argument_order() {
		let spec = ContractCallSpec::new("CCONTRACT", "approve_creator")
			.arg(TypedArg::address("GADMIN"))
			.arg(TypedArg::address("GCREATOR"))
			.arg(TypedArg::string("ref-123"));

		assert_eq!(spec.method, "approve_creator");
		assert_eq!(spec.args.len(), 3);
		assert_eq!(spec.args[0].value, NativeValue::Address("GADMIN".into()));
		assert_eq!(spec.args[2].kind, ValueKind::String);
	}

	#[test]
	fn test_u64_decimal_is_string_backed() {
		let arg = TypedArg::u64_decimal("9007199254740993");
		assert_eq!(arg.kind, ValueKind::U64);
		assert_eq!(arg.value, NativeValue::String("9007199254740993".into()));
	}
}
