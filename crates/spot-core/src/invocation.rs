//! End-to-end contract invocation.
//!
//! A state-changing call runs build, sign, submit and confirm in order and
//! stops at the first error. A read-only call builds an unsigned
//! transaction, simulates it and decodes the simulated return value; it
//! never submits anything.

use crate::{InvocationError, InvocationErrorKind};
use spot_account::AccountService;
use spot_codec::{decode, decode_base64};
use spot_delivery::{ConfirmationOutcome, DeliveryService, RpcInterface};
use spot_types::{
	truncate_id, ContractCallSpec, EndpointConfig, NativeValue, SubmissionStatus, TransactionHash,
};
use std::future::Future;
use std::sync::Arc;
use stellar_xdr::curr::ScVal;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

pub(crate) const INVOKE: &str = "invoke";
pub(crate) const SIMULATE: &str = "simulate";

/// Ledger outcome of a confirmed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
	Success {
		ledger: Option<u64>,
		return_value: Option<NativeValue>,
	},
	/// Applied by the ledger but failed, e.g. a contract panic.
	Failed { diagnostic: String },
}

/// Record of a submitted invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationReceipt {
	pub contract_id: String,
	pub method: String,
	pub transaction_hash: TransactionHash,
	/// Base64 XDR of the envelope as submitted.
	pub signed_envelope_xdr: String,
	pub submission_status: SubmissionStatus,
	pub outcome: InvocationOutcome,
}

impl InvocationReceipt {
	pub fn is_success(&self) -> bool {
		matches!(self.outcome, InvocationOutcome::Success { .. })
	}

	pub fn return_value(&self) -> Option<&NativeValue> {
		match &self.outcome {
			InvocationOutcome::Success { return_value, .. } => return_value.as_ref(),
			InvocationOutcome::Failed { .. } => None,
		}
	}

	/// Converts a `Failed` outcome into a `TransactionFailed` error.
	pub fn into_success(self) -> Result<Self, InvocationError> {
		match &self.outcome {
			InvocationOutcome::Success { .. } => Ok(self),
			InvocationOutcome::Failed { diagnostic } => Err(InvocationError {
				operation: INVOKE,
				contract_id: self.contract_id.clone(),
				method: self.method.clone(),
				transaction_hash: Some(self.transaction_hash.clone()),
				kind: InvocationErrorKind::TransactionFailed {
					diagnostic: diagnostic.clone(),
				},
			}),
		}
	}
}

/// Runs contract invocations against one RPC endpoint.
///
/// Holds no state between calls beyond the endpoint configuration, so one
/// instance can serve concurrent callers.
pub struct ContractInvocationService {
	delivery: DeliveryService,
}

impl ContractInvocationService {
	pub fn new(rpc: Arc<dyn RpcInterface>, endpoint: EndpointConfig) -> Self {
		Self {
			delivery: DeliveryService::new(rpc, endpoint),
		}
	}

	pub fn endpoint(&self) -> &EndpointConfig {
		self.delivery.endpoint()
	}

	/// Invokes a state-changing contract method and waits for the outcome.
	pub async fn invoke(
		&self,
		signer: &AccountService,
		spec: &ContractCallSpec,
	) -> Result<InvocationReceipt, InvocationError> {
		self.invoke_with_cancel(signer, spec, &CancellationToken::new())
			.await
	}

	/// Like [`invoke`](Self::invoke), abandoning the call when `cancel` fires.
	///
	/// Cancelling after submission does not withdraw the transaction; the
	/// returned error carries the hash so the outcome can be checked later.
	#[instrument(skip_all, fields(contract = %truncate_id(&spec.contract_id), method = %spec.method))]
	pub async fn invoke_with_cancel(
		&self,
		signer: &AccountService,
		spec: &ContractCallSpec,
		cancel: &CancellationToken,
	) -> Result<InvocationReceipt, InvocationError> {
		let fail = |kind| InvocationError::new(INVOKE, spec, kind);

		let source = until_cancelled(cancel, signer.get_address())
			.await
			.map_err(fail)?;
		let prepared = until_cancelled(cancel, self.delivery.prepare(&source, spec))
			.await
			.map_err(fail)?;
		let simulated_value = prepared.return_value;
		let signed = until_cancelled(
			cancel,
			signer.sign(prepared.envelope, &self.endpoint().network_passphrase),
		)
		.await
		.map_err(fail)?;

		let submission = until_cancelled(cancel, self.delivery.submit(&signed))
			.await
			.map_err(fail)?;
		let hash = submission.hash.clone();
		tracing::info!(
			tx_hash = %truncate_id(hash.as_str()),
			status = %submission.status,
			"Submitted contract invocation"
		);

		let outcome = until_cancelled(cancel, self.delivery.confirm(&hash))
			.await
			.map_err(|kind| fail(kind).with_hash(hash.clone()))?;

		let outcome = match outcome {
			ConfirmationOutcome::Success {
				ledger,
				return_value,
				..
			} => InvocationOutcome::Success {
				ledger,
				return_value: confirmed_value(&hash, return_value.or(simulated_value)),
			},
			ConfirmationOutcome::Failed { diagnostic } => InvocationOutcome::Failed { diagnostic },
			ConfirmationOutcome::TimedOut { attempts } => {
				return Err(fail(InvocationErrorKind::TimedOut { attempts }).with_hash(hash));
			},
		};

		Ok(InvocationReceipt {
			contract_id: spec.contract_id.clone(),
			method: spec.method.clone(),
			transaction_hash: hash,
			signed_envelope_xdr: signed.xdr,
			submission_status: submission.status,
			outcome,
		})
	}

	/// Evaluates a read-only contract method through simulation.
	pub async fn simulate(
		&self,
		signer: &AccountService,
		spec: &ContractCallSpec,
	) -> Result<NativeValue, InvocationError> {
		self.simulate_with_cancel(signer, spec, &CancellationToken::new())
			.await
	}

	pub async fn simulate_with_cancel(
		&self,
		signer: &AccountService,
		spec: &ContractCallSpec,
		cancel: &CancellationToken,
	) -> Result<NativeValue, InvocationError> {
		let value = self.simulate_value_with_cancel(signer, spec, cancel).await?;
		decode(&value).map_err(|e| InvocationError::new(SIMULATE, spec, e.into()))
	}

	/// Simulates a call and returns the undecoded contract value.
	///
	/// Used by callers that project the value into a typed record.
	#[instrument(skip_all, fields(contract = %truncate_id(&spec.contract_id), method = %spec.method))]
	pub async fn simulate_value_with_cancel(
		&self,
		signer: &AccountService,
		spec: &ContractCallSpec,
		cancel: &CancellationToken,
	) -> Result<ScVal, InvocationError> {
		let fail = |kind| InvocationError::new(SIMULATE, spec, kind);

		let source = until_cancelled(cancel, signer.get_address())
			.await
			.map_err(fail)?;
		let simulation = until_cancelled(cancel, self.delivery.simulate(&source, spec))
			.await
			.map_err(fail)?;

		let Some(encoded) = simulation.return_value.as_deref() else {
			return Err(fail(InvocationErrorKind::EmptySimulationResult));
		};
		tracing::debug!(latest_ledger = simulation.latest_ledger, "Simulated contract call");
		decode_base64(encoded).map_err(|e| fail(e.into()))
	}
}

/// Races `fut` against `cancel`, preferring cancellation when both are ready.
async fn until_cancelled<T, E>(
	cancel: &CancellationToken,
	fut: impl Future<Output = Result<T, E>>,
) -> Result<T, InvocationErrorKind>
where
	E: Into<InvocationErrorKind>,
{
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(InvocationErrorKind::Cancelled),
		result = fut => result.map_err(Into::into),
	}
}

/// Decodes a confirmed return value.
///
/// The transaction has already succeeded at this point, so an undecodable
/// value is logged and dropped rather than turned into an error.
fn confirmed_value(hash: &TransactionHash, value: Option<ScVal>) -> Option<NativeValue> {
	let value = value?;
	match decode(&value) {
		Ok(native) => Some(native),
		Err(e) => {
			tracing::warn!(
				tx_hash = %truncate_id(hash.as_str()),
				error = %e,
				"Could not decode return value of confirmed transaction"
			);
			None
		},
	}
}
