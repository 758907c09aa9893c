//! Response types returned by [`RpcInterface`](crate::RpcInterface).

use serde_json::Value;
use spot_types::TransactionStatus;
use stellar_xdr::curr::ScVal;

/// Account id and sequence number from `getAccount`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
	pub account_id: String,
	pub sequence: i64,
}

/// Result of `simulateTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationResponse {
	/// Base64 `SorobanTransactionData` to attach before signing.
	pub transaction_data: Option<String>,
	pub min_resource_fee: u64,
	/// Base64 `SorobanAuthorizationEntry` values for the invoke operation.
	pub auth: Vec<String>,
	/// Base64 `ScVal` returned by the simulated call, if any.
	pub return_value: Option<String>,
	/// Simulation failure message, such as a contract trap.
	pub error: Option<String>,
	/// Set when archived entries must be restored before the call can run.
	pub restore_required: bool,
	pub latest_ledger: u64,
}

impl SimulationResponse {
	/// Failure message if simulation did not produce a usable result.
	pub fn failure(&self) -> Option<String> {
		if let Some(error) = &self.error {
			return Some(error.clone());
		}
		if self.restore_required {
			return Some("ledger entries must be restored before invocation".to_string());
		}
		None
	}
}

/// Result of `sendTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendTransactionResponse {
	pub hash: String,
	/// Raw status string: `PENDING`, `DUPLICATE`, `TRY_AGAIN_LATER` or `ERROR`.
	pub status: String,
	pub error_result_xdr: Option<String>,
	pub diagnostic_events_xdr: Vec<String>,
}

/// Result of `getTransaction`.
///
/// On the structured path `return_value` and `result_code` come from the
/// decoded XDR. On the raw path only the string fields are populated.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStatusResponse {
	pub status: TransactionStatus,
	pub ledger: Option<u64>,
	/// Return value of the invoked contract function.
	pub return_value: Option<ScVal>,
	/// Decoded transaction result code, such as `TxFailed (Trapped)`.
	pub result_code: Option<String>,
	pub result_xdr: Option<String>,
	pub result_meta_xdr: Option<String>,
	/// The JSON `result` object as returned by the endpoint.
	pub raw: Value,
}

impl TransactionStatusResponse {
	pub fn new(status: TransactionStatus) -> Self {
		Self {
			status,
			ledger: None,
			return_value: None,
			result_code: None,
			result_xdr: None,
			result_meta_xdr: None,
			raw: Value::Null,
		}
	}

	pub fn pending() -> Self {
		Self::new(TransactionStatus::Pending)
	}

	pub fn success(ledger: u64, return_value: Option<ScVal>) -> Self {
		Self {
			ledger: Some(ledger),
			return_value,
			..Self::new(TransactionStatus::Success)
		}
	}

	pub fn failed() -> Self {
		Self::new(TransactionStatus::Failed)
	}
}
