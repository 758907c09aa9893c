//! Contract invocation engine for the SPOT application.
//!
//! [`ContractInvocationService`] runs state-changing calls end to end
//! (build, sign, submit, confirm) and read-only calls through simulation.
//! [`SpotContract`] layers the SPOT contract's methods on top with typed
//! arguments and results.
//!
//! The engine is stateless between calls. Two concurrent invocations signed
//! by the same account may race on the account sequence number and one of
//! them can be rejected; callers that need ordering must serialize calls
//! per signer.

use spot_account::AccountError;
use spot_codec::CodecError;
use spot_delivery::{DeliveryError, RpcError};
use spot_types::{ContractCallSpec, TransactionHash};
use std::fmt;
use thiserror::Error;

pub mod invocation;
pub mod spot;

#[cfg(test)]
mod test_support;

pub use invocation::{ContractInvocationService, InvocationOutcome, InvocationReceipt};
pub use spot::{ClaimedEvent, Confirmed, EventSummary, SpotContract};

/// What went wrong during an invocation.
#[derive(Debug, Error)]
pub enum InvocationErrorKind {
	/// Building or simulating the transaction failed, e.g. a contract trap.
	#[error("preparation failed: {0}")]
	Preparation(String),
	#[error("invalid signer: {0}")]
	InvalidSigner(String),
	/// The endpoint refused the signed transaction.
	#[error("submission rejected ({status}): {diagnostic}")]
	SubmissionRejected { status: String, diagnostic: String },
	/// A contract value did not have the expected shape.
	#[error("decode failed: {0}")]
	Decode(#[from] CodecError),
	/// No terminal status within the poll budget. The outcome is unknown
	/// and must be checked by hash.
	#[error("no confirmation after {attempts} polls")]
	TimedOut { attempts: u32 },
	#[error("simulation returned no value")]
	EmptySimulationResult,
	/// The ledger applied the transaction and it failed.
	#[error("transaction failed: {diagnostic}")]
	TransactionFailed { diagnostic: String },
	#[error("rpc error: {0}")]
	Rpc(#[from] RpcError),
	#[error("cancelled")]
	Cancelled,
}

impl From<DeliveryError> for InvocationErrorKind {
	fn from(e: DeliveryError) -> Self {
		match e {
			DeliveryError::Rpc(e) => InvocationErrorKind::Rpc(e),
			DeliveryError::SubmissionRejected { status, diagnostic } => {
				InvocationErrorKind::SubmissionRejected { status, diagnostic }
			},
			DeliveryError::Preparation(message) => InvocationErrorKind::Preparation(message),
			other @ (DeliveryError::Encoding(_) | DeliveryError::Xdr(_)) => {
				InvocationErrorKind::Preparation(other.to_string())
			},
		}
	}
}

impl From<AccountError> for InvocationErrorKind {
	fn from(e: AccountError) -> Self {
		InvocationErrorKind::InvalidSigner(e.to_string())
	}
}

/// An invocation error with the context needed to log it usefully.
#[derive(Debug)]
pub struct InvocationError {
	/// `invoke` or `simulate`.
	pub operation: &'static str,
	pub contract_id: String,
	pub method: String,
	/// Set once the transaction has been submitted.
	pub transaction_hash: Option<TransactionHash>,
	pub kind: InvocationErrorKind,
}

impl InvocationError {
	pub fn new(operation: &'static str, spec: &ContractCallSpec, kind: InvocationErrorKind) -> Self {
		Self {
			operation,
			contract_id: spec.contract_id.clone(),
			method: spec.method.clone(),
			transaction_hash: None,
			kind,
		}
	}

	pub fn with_hash(mut self, hash: TransactionHash) -> Self {
		self.transaction_hash = Some(hash);
		self
	}
}

impl fmt::Display for InvocationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} on {}",
			self.operation, self.method, self.contract_id
		)?;
		if let Some(hash) = &self.transaction_hash {
			write!(f, " (tx {})", hash)?;
		}
		write!(f, ": {}", self.kind)
	}
}

impl std::error::Error for InvocationError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.kind)
	}
}
