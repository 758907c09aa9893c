//! Transaction delivery types.
//!
//! This module defines the types exchanged between submission and
//! confirmation: the opaque transaction hash, the immediate submission
//! status and the polled ledger status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction hash as returned by the RPC endpoint.
///
/// Treated as opaque: it is stored verbatim and only ever compared or
/// echoed back to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(pub String);

impl TransactionHash {
	pub fn new(hash: impl Into<String>) -> Self {
		Self(hash.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Status returned by `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
	Pending,
	Duplicate,
	TryAgainLater,
	Error,
	/// Any status string this client does not know.
	Other(String),
}

impl SubmissionStatus {
	pub fn parse(status: &str) -> Self {
		match status {
			"PENDING" => SubmissionStatus::Pending,
			"DUPLICATE" => SubmissionStatus::Duplicate,
			"TRY_AGAIN_LATER" => SubmissionStatus::TryAgainLater,
			"ERROR" => SubmissionStatus::Error,
			other => SubmissionStatus::Other(other.to_string()),
		}
	}
}

impl fmt::Display for SubmissionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SubmissionStatus::Pending => f.write_str("PENDING"),
			SubmissionStatus::Duplicate => f.write_str("DUPLICATE"),
			SubmissionStatus::TryAgainLater => f.write_str("TRY_AGAIN_LATER"),
			SubmissionStatus::Error => f.write_str("ERROR"),
			SubmissionStatus::Other(s) => f.write_str(s),
		}
	}
}

/// Accepted submission: the hash to poll and the initial status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
	pub hash: TransactionHash,
	pub status: SubmissionStatus,
}

/// Ledger status returned by `getTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
	/// Not yet visible to the endpoint (`NOT_FOUND`) or still in flight.
	Pending,
	Success,
	Failed,
	/// Unrecognised status string; treated as non-terminal.
	Unknown(String),
}

impl TransactionStatus {
	pub fn parse(status: &str) -> Self {
		match status {
			"SUCCESS" => TransactionStatus::Success,
			"FAILED" => TransactionStatus::Failed,
			"NOT_FOUND" | "PENDING" => TransactionStatus::Pending,
			other => TransactionStatus::Unknown(other.to_string()),
		}
	}

	/// Whether polling should stop at this status.
	pub fn is_terminal(&self) -> bool {
		matches!(self, TransactionStatus::Success | TransactionStatus::Failed)
	}
}

impl fmt::Display for TransactionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransactionStatus::Pending => f.write_str("PENDING"),
			TransactionStatus::Success => f.write_str("SUCCESS"),
			TransactionStatus::Failed => f.write_str("FAILED"),
			TransactionStatus::Unknown(s) => f.write_str(s),
		}
	}
}
