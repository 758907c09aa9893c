//! Common types for the SPOT contract invocation engine.
//!
//! This crate defines the plain data types shared by the codec, the RPC
//! delivery layer, the signer and the invocation service. It has no
//! dependency on the Stellar XDR crates so that callers can build call
//! specifications and read decoded records without pulling in the wire
//! format.

/// Contract call specifications and typed arguments.
pub mod call;
/// Transaction hashes and submission/confirmation status types.
pub mod delivery;
/// Typed projections of the SPOT contract's struct return values.
pub mod events;
/// RPC endpoint configuration.
pub mod networks;
/// Secret string wrapper for key material.
pub mod secret_string;
/// Formatting and serialization helpers.
pub mod utils;
/// Native values produced by decoding contract return values.
pub mod value;

pub use call::{ContractCallSpec, TypedArg, ValueKind};
pub use delivery::{SubmissionResult, SubmissionStatus, TransactionHash, TransactionStatus};
pub use events::{CreatorApproval, EventRecord, NewEvent};
pub use networks::EndpointConfig;
pub use secret_string::SecretString;
pub use utils::truncate_id;
pub use value::NativeValue;
