//! Submission of signed envelopes.

use crate::{DeliveryError, RpcError, RpcInterface, SendTransactionResponse};
use spot_account::SignedEnvelope;
use spot_types::{truncate_id, SubmissionResult, SubmissionStatus, TransactionHash};
use std::sync::Arc;

/// Sends signed envelopes and classifies the endpoint's immediate answer.
pub struct SubmissionClient {
	rpc: Arc<dyn RpcInterface>,
}

impl SubmissionClient {
	pub fn new(rpc: Arc<dyn RpcInterface>) -> Self {
		Self { rpc }
	}

	/// Submits a signed envelope.
	///
	/// An error result or an `ERROR` status is a rejection. Every other
	/// status is accepted and its hash handed back for confirmation.
	pub async fn submit(&self, signed: &SignedEnvelope) -> Result<SubmissionResult, DeliveryError> {
		let response = self.rpc.send_transaction(&signed.xdr).await?;
		let result = classify(response)?;

		if result.status == SubmissionStatus::TryAgainLater {
			tracing::warn!(
				tx_hash = %truncate_id(result.hash.as_str()),
				"Endpoint asked to try again later; confirming anyway"
			);
		} else {
			tracing::info!(
				tx_hash = %truncate_id(result.hash.as_str()),
				status = %result.status,
				"Submitted transaction"
			);
		}
		Ok(result)
	}
}

/// Classifies a `sendTransaction` response.
pub fn classify(response: SendTransactionResponse) -> Result<SubmissionResult, DeliveryError> {
	let status = SubmissionStatus::parse(&response.status);

	if response.error_result_xdr.is_some() || status == SubmissionStatus::Error {
		let mut diagnostic = response
			.error_result_xdr
			.unwrap_or_else(|| "no error result returned".to_string());
		if !response.diagnostic_events_xdr.is_empty() {
			diagnostic = format!(
				"{} (diagnostic events: {})",
				diagnostic,
				response.diagnostic_events_xdr.join(", ")
			);
		}
		return Err(DeliveryError::SubmissionRejected {
			status: response.status,
			diagnostic,
		});
	}

	if response.hash.is_empty() {
		return Err(RpcError::InvalidResponse(
			"sendTransaction returned no hash".to_string(),
		)
		.into());
	}

	Ok(SubmissionResult {
		hash: TransactionHash::new(response.hash),
		status,
	})
}
