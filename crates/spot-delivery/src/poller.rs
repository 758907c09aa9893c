//! Confirmation polling.
//!
//! After submission a transaction is `PENDING` until the endpoint reports it
//! as `SUCCESS` or `FAILED`. The poller queries by hash at a fixed interval
//! for a bounded number of attempts. If the structured fetch reports a
//! schema mismatch, the poller switches to the raw fetch path for the rest
//! of the call and re-issues the poll immediately.

use crate::{DeliveryError, RpcError, RpcInterface, TransactionStatusResponse};
use spot_types::{truncate_id, EndpointConfig, TransactionHash, TransactionStatus};
use std::sync::Arc;
use std::time::Duration;
use stellar_xdr::curr::ScVal;

/// Polling interval and attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
	pub interval: Duration,
	pub attempts: u32,
}

impl PollPolicy {
	pub fn from_endpoint(endpoint: &EndpointConfig) -> Self {
		Self {
			interval: endpoint.poll_interval(),
			attempts: endpoint.poll_attempts,
		}
	}
}

/// How the poller fetches transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
	/// `get_transaction`, with XDR decoding.
	Structured,
	/// `get_transaction_raw`, without XDR decoding.
	Tolerant,
}

/// Terminal result of confirmation polling.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
	Success {
		ledger: Option<u64>,
		return_value: Option<ScVal>,
		result_meta_xdr: Option<String>,
	},
	/// The ledger applied and rejected the transaction.
	Failed { diagnostic: String },
	/// No terminal status within the attempt budget. The transaction may
	/// still land.
	TimedOut { attempts: u32 },
}

/// Polls transaction status until a terminal state.
pub struct ConfirmationPoller {
	rpc: Arc<dyn RpcInterface>,
	policy: PollPolicy,
}

impl ConfirmationPoller {
	pub fn new(rpc: Arc<dyn RpcInterface>, policy: PollPolicy) -> Self {
		Self { rpc, policy }
	}

	/// Waits for `hash` to reach a terminal state.
	///
	/// Transport errors end the call. There is no sleep after the last
	/// attempt.
	pub async fn wait(&self, hash: &TransactionHash) -> Result<ConfirmationOutcome, DeliveryError> {
		let mut path = FetchPath::Structured;

		for attempt in 1..=self.policy.attempts {
			let response = self.fetch(hash, &mut path, attempt).await?;

			if response.status.is_terminal() {
				return Ok(terminal_outcome(hash, attempt, response));
			}
			tracing::debug!(
				tx_hash = %truncate_id(hash.as_str()),
				status = %response.status,
				attempt,
				"Transaction not yet final"
			);

			if attempt < self.policy.attempts {
				tokio::time::sleep(self.policy.interval).await;
			}
		}

		tracing::warn!(
			tx_hash = %truncate_id(hash.as_str()),
			attempts = self.policy.attempts,
			"Gave up waiting for confirmation"
		);
		Ok(ConfirmationOutcome::TimedOut {
			attempts: self.policy.attempts,
		})
	}

	async fn fetch(
		&self,
		hash: &TransactionHash,
		path: &mut FetchPath,
		attempt: u32,
	) -> Result<TransactionStatusResponse, DeliveryError> {
		if *path == FetchPath::Tolerant {
			return Ok(self.rpc.get_transaction_raw(hash).await?);
		}

		match self.rpc.get_transaction(hash).await {
			Ok(response) => Ok(response),
			Err(RpcError::SchemaMismatch(reason)) => {
				tracing::warn!(
					tx_hash = %truncate_id(hash.as_str()),
					attempt,
					reason = %reason,
					"Could not decode transaction status, switching to raw fetch"
				);
				*path = FetchPath::Tolerant;
				Ok(self.rpc.get_transaction_raw(hash).await?)
			},
			Err(e) => Err(e.into()),
		}
	}
}

fn terminal_outcome(
	hash: &TransactionHash,
	attempt: u32,
	response: TransactionStatusResponse,
) -> ConfirmationOutcome {
	if response.status == TransactionStatus::Success {
		tracing::info!(
			tx_hash = %truncate_id(hash.as_str()),
			ledger = ?response.ledger,
			attempt,
			"Transaction confirmed"
		);
		return ConfirmationOutcome::Success {
			ledger: response.ledger,
			return_value: response.return_value,
			result_meta_xdr: response.result_meta_xdr,
		};
	}

	let diagnostic = failure_diagnostic(&response);
	tracing::info!(
		tx_hash = %truncate_id(hash.as_str()),
		diagnostic = %diagnostic,
		"Transaction failed"
	);
	ConfirmationOutcome::Failed { diagnostic }
}

/// Builds a readable diagnostic for a failed transaction.
///
/// Uses, in order: the decoded result code, the raw result XDR, the JSON
/// response object, and finally the status itself.
pub fn failure_diagnostic(response: &TransactionStatusResponse) -> String {
	if let Some(code) = response.result_code.as_deref().filter(|c| !c.is_empty()) {
		return code.to_string();
	}
	if let Some(xdr) = response.result_xdr.as_deref().filter(|x| !x.is_empty()) {
		return xdr.to_string();
	}
	if !response.raw.is_null() {
		return response.raw.to_string();
	}
	format!("transaction {}", response.status)
}
