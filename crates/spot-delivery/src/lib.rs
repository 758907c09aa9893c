//! Transaction delivery for Soroban contract calls.
//!
//! This crate covers everything between a contract call specification and a
//! terminal ledger outcome: building and preparing the transaction against a
//! Soroban RPC endpoint, submitting the signed envelope, and polling the
//! endpoint until the transaction succeeds, fails or the confirmation budget
//! runs out. The RPC endpoint sits behind [`RpcInterface`] so the pipeline
//! can run against the JSON-RPC client or a test double.

use async_trait::async_trait;
use spot_account::SignedEnvelope;
use spot_codec::CodecError;
use spot_types::{ContractCallSpec, EndpointConfig, SubmissionResult, TransactionHash};
use std::sync::Arc;
use thiserror::Error;

pub mod builder;
pub mod poller;
pub mod submit;
pub mod types;

/// Re-export implementations
pub mod implementations {
	pub mod soroban {
		pub mod jsonrpc;
	}
}

pub use builder::{PreparedTransaction, TransactionBuilder};
pub use poller::{ConfirmationOutcome, ConfirmationPoller, FetchPath, PollPolicy};
pub use submit::SubmissionClient;
pub use types::{AccountInfo, SendTransactionResponse, SimulationResponse, TransactionStatusResponse};

/// Errors reported by the RPC transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
	/// HTTP or connection failure, including request timeouts.
	#[error("Network error: {0}")]
	Network(String),
	/// JSON-RPC error object returned by the endpoint.
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	/// The response did not have the expected JSON shape.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Account not found: {0}")]
	AccountNotFound(String),
	/// Response XDR carries a union arm this client cannot decode.
	///
	/// Signals version skew between the endpoint and the XDR definitions,
	/// not a transaction failure. Callers may retry on a path that skips
	/// XDR decoding.
	#[error("Response schema mismatch: {0}")]
	SchemaMismatch(String),
	#[error("XDR error: {0}")]
	Xdr(String),
}

impl From<stellar_xdr::curr::Error> for RpcError {
	fn from(e: stellar_xdr::curr::Error) -> Self {
		match e {
			stellar_xdr::curr::Error::Invalid => RpcError::SchemaMismatch(e.to_string()),
			other => RpcError::Xdr(other.to_string()),
		}
	}
}

/// Errors that can occur while delivering a transaction.
#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error(transparent)]
	Rpc(#[from] RpcError),
	/// Simulation rejected the call, or its result could not be applied.
	#[error("Preparation failed: {0}")]
	Preparation(String),
	#[error("Encoding failed: {0}")]
	Encoding(#[from] CodecError),
	/// The endpoint refused the signed transaction outright.
	#[error("Submission rejected ({status}): {diagnostic}")]
	SubmissionRejected { status: String, diagnostic: String },
	#[error("XDR error: {0}")]
	Xdr(String),
}

/// Trait defining the Soroban RPC operations the delivery pipeline needs.
///
/// `get_transaction` decodes result and meta XDR and reports unknown union
/// arms as [`RpcError::SchemaMismatch`]. `get_transaction_raw` returns the
/// same response without decoding XDR.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RpcInterface: Send + Sync {
	/// Loads the account's id and current sequence number.
	async fn get_account(&self, address: &str) -> Result<AccountInfo, RpcError>;

	/// Simulates a base64 XDR transaction envelope.
	async fn simulate_transaction(&self, envelope_xdr: &str)
		-> Result<SimulationResponse, RpcError>;

	/// Submits a signed base64 XDR transaction envelope.
	async fn send_transaction(&self, envelope_xdr: &str)
		-> Result<SendTransactionResponse, RpcError>;

	/// Fetches transaction status, decoding result and meta XDR.
	async fn get_transaction(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatusResponse, RpcError>;

	/// Fetches transaction status without strict XDR decoding.
	async fn get_transaction_raw(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatusResponse, RpcError>;
}

/// Service that runs the delivery pipeline against one RPC endpoint.
///
/// Holds the endpoint configuration for its lifetime. Several services with
/// different configurations can share one process.
pub struct DeliveryService {
	builder: TransactionBuilder,
	submission: SubmissionClient,
	poller: ConfirmationPoller,
	endpoint: EndpointConfig,
}

impl DeliveryService {
	pub fn new(rpc: Arc<dyn RpcInterface>, endpoint: EndpointConfig) -> Self {
		Self {
			builder: TransactionBuilder::new(rpc.clone(), endpoint.clone()),
			submission: SubmissionClient::new(rpc.clone()),
			poller: ConfirmationPoller::new(rpc, PollPolicy::from_endpoint(&endpoint)),
			endpoint,
		}
	}

	pub fn endpoint(&self) -> &EndpointConfig {
		&self.endpoint
	}

	/// Builds and prepares a transaction for `source`.
	pub async fn prepare(
		&self,
		source: &str,
		spec: &ContractCallSpec,
	) -> Result<PreparedTransaction, DeliveryError> {
		self.builder.build(source, spec).await
	}

	/// Builds and simulates a transaction without preparing it for signing.
	pub async fn simulate(
		&self,
		source: &str,
		spec: &ContractCallSpec,
	) -> Result<SimulationResponse, DeliveryError> {
		let envelope = self.builder.build_unsigned(source, spec).await?;
		self.builder.simulate(&envelope).await
	}

	/// Submits a signed envelope.
	pub async fn submit(&self, signed: &SignedEnvelope) -> Result<SubmissionResult, DeliveryError> {
		self.submission.submit(signed).await
	}

	/// Polls until the transaction reaches a terminal state or the budget
	/// runs out.
	pub async fn confirm(
		&self,
		hash: &TransactionHash,
	) -> Result<ConfirmationOutcome, DeliveryError> {
		self.poller.wait(hash).await
	}
}
