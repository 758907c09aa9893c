//! JSON-RPC 2.0 client for Soroban RPC endpoints.
//!
//! Implements [`RpcInterface`] over HTTP with `reqwest`. Response bodies are
//! parsed by plain functions so the parsing rules can be tested without a
//! server.

use crate::{
	AccountInfo, RpcError, RpcInterface, SendTransactionResponse, SimulationResponse,
	TransactionStatusResponse,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use spot_types::{EndpointConfig, TransactionHash, TransactionStatus};
use stellar_xdr::curr::{
	InvokeHostFunctionResult, Limits, OperationResult, OperationResultTr, ReadXdr, ScVal,
	TransactionMeta, TransactionResult, TransactionResultResult,
};

/// Soroban RPC client over HTTP.
pub struct JsonRpcClient {
	client: reqwest::Client,
	url: String,
}

impl JsonRpcClient {
	/// Creates a client for the endpoint's RPC URL, with the endpoint's
	/// per-request timeout.
	pub fn new(endpoint: &EndpointConfig) -> Result<Self, RpcError> {
		let client = reqwest::Client::builder()
			.timeout(endpoint.request_timeout())
			.build()
			.map_err(|e| RpcError::Network(format!("failed to build HTTP client: {}", e)))?;
		Ok(Self {
			client,
			url: endpoint.rpc_url.clone(),
		})
	}

	async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let body = build_jsonrpc_request(method, params);
		let response = self
			.client
			.post(&self.url)
			.json(&body)
			.send()
			.await
			.map_err(|e| RpcError::Network(format!("{} request failed: {}", method, e)))?;

		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| RpcError::Network(format!("reading {} response: {}", method, e)))?;

		if !status.is_success() {
			return Err(RpcError::Network(format!("HTTP {}: {}", status, text)));
		}

		serde_json::from_str(&text)
			.map_err(|e| RpcError::InvalidResponse(format!("invalid JSON: {}", e)))
	}
}

#[async_trait]
impl RpcInterface for JsonRpcClient {
	async fn get_account(&self, address: &str) -> Result<AccountInfo, RpcError> {
		let response = self.call("getAccount", json!({ "address": address })).await?;
		parse_account_response(&response, address)
	}

	async fn simulate_transaction(
		&self,
		envelope_xdr: &str,
	) -> Result<SimulationResponse, RpcError> {
		let response = self
			.call("simulateTransaction", json!({ "transaction": envelope_xdr }))
			.await?;
		parse_simulate_response(&response)
	}

	async fn send_transaction(
		&self,
		envelope_xdr: &str,
	) -> Result<SendTransactionResponse, RpcError> {
		let response = self
			.call("sendTransaction", json!({ "transaction": envelope_xdr }))
			.await?;
		parse_send_transaction_response(&response)
	}

	async fn get_transaction(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatusResponse, RpcError> {
		let response = self
			.call("getTransaction", json!({ "hash": hash.as_str() }))
			.await?;
		parse_get_transaction_response(&response)
	}

	async fn get_transaction_raw(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionStatusResponse, RpcError> {
		let response = self
			.call("getTransaction", json!({ "hash": hash.as_str() }))
			.await?;
		parse_get_transaction_raw(&response)
	}
}

/// Builds a JSON-RPC 2.0 request body.
pub(crate) fn build_jsonrpc_request(method: &str, params: Value) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": 1,
		"method": method,
		"params": params
	})
}

fn rpc_error(error: &Value) -> RpcError {
	let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
	let message = error
		.get("message")
		.and_then(|m| m.as_str())
		.unwrap_or("unknown error")
		.to_string();
	RpcError::Rpc { code, message }
}

/// Returns the `result` object or the JSON-RPC error.
fn result_of(response: &Value) -> Result<&Value, RpcError> {
	if let Some(error) = response.get("error") {
		return Err(rpc_error(error));
	}
	response
		.get("result")
		.ok_or_else(|| RpcError::InvalidResponse("missing 'result' field".to_string()))
}

fn string_field(result: &Value, key: &str) -> Option<String> {
	result
		.get(key)
		.and_then(|v| v.as_str())
		.filter(|s| !s.is_empty())
		.map(String::from)
}

/// Reads an integer the endpoint may send as a number or a decimal string.
fn u64_field(result: &Value, key: &str) -> Option<u64> {
	result
		.get(key)
		.and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
}

fn string_array(value: Option<&Value>) -> Vec<String> {
	value
		.and_then(|v| v.as_array())
		.map(|arr| arr.iter().filter_map(|e| e.as_str().map(String::from)).collect())
		.unwrap_or_default()
}

pub(crate) fn parse_account_response(
	response: &Value,
	address: &str,
) -> Result<AccountInfo, RpcError> {
	if let Some(error) = response.get("error") {
		let err = rpc_error(error);
		if let RpcError::Rpc { message, .. } = &err {
			if message.to_lowercase().contains("not found") {
				return Err(RpcError::AccountNotFound(address.to_string()));
			}
		}
		return Err(err);
	}
	let result = result_of(response)?;

	let sequence = result
		.get("sequence")
		.and_then(|v| v.as_str().and_then(|s| s.parse::<i64>().ok()).or_else(|| v.as_i64()))
		.ok_or_else(|| {
			RpcError::InvalidResponse("missing or invalid 'sequence' field".to_string())
		})?;

	Ok(AccountInfo {
		account_id: string_field(result, "id").unwrap_or_else(|| address.to_string()),
		sequence,
	})
}

pub(crate) fn parse_simulate_response(response: &Value) -> Result<SimulationResponse, RpcError> {
	let result = result_of(response)?;

	let (return_value, auth) = match result
		.get("results")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
	{
		Some(first) => (string_field(first, "xdr"), string_array(first.get("auth"))),
		None => (None, Vec::new()),
	};

	Ok(SimulationResponse {
		transaction_data: string_field(result, "transactionData"),
		min_resource_fee: u64_field(result, "minResourceFee").unwrap_or(0),
		auth,
		return_value,
		error: result.get("error").map(|e| match e.as_str() {
			Some(s) => s.to_string(),
			None => e.to_string(),
		}),
		restore_required: result.get("restorePreamble").is_some_and(|v| !v.is_null()),
		latest_ledger: u64_field(result, "latestLedger").unwrap_or(0),
	})
}

pub(crate) fn parse_send_transaction_response(
	response: &Value,
) -> Result<SendTransactionResponse, RpcError> {
	let result = result_of(response)?;

	Ok(SendTransactionResponse {
		hash: string_field(result, "hash").unwrap_or_default(),
		status: string_field(result, "status").unwrap_or_else(|| "UNKNOWN".to_string()),
		error_result_xdr: string_field(result, "errorResultXdr"),
		diagnostic_events_xdr: string_array(result.get("diagnosticEventsXdr")),
	})
}

/// Parses `getTransaction` without decoding any XDR.
pub(crate) fn parse_get_transaction_raw(
	response: &Value,
) -> Result<TransactionStatusResponse, RpcError> {
	let result = result_of(response)?;
	let status = result
		.get("status")
		.and_then(|v| v.as_str())
		.map(TransactionStatus::parse)
		.ok_or_else(|| RpcError::InvalidResponse("missing 'status' field".to_string()))?;

	Ok(TransactionStatusResponse {
		ledger: u64_field(result, "ledger"),
		result_xdr: string_field(result, "resultXdr"),
		result_meta_xdr: string_field(result, "resultMetaXdr"),
		raw: result.clone(),
		..TransactionStatusResponse::new(status)
	})
}

/// Parses `getTransaction` and decodes result and meta XDR.
///
/// Unknown union arms in either payload surface as
/// [`RpcError::SchemaMismatch`].
pub(crate) fn parse_get_transaction_response(
	response: &Value,
) -> Result<TransactionStatusResponse, RpcError> {
	let mut parsed = parse_get_transaction_raw(response)?;

	if let Some(meta) = parsed.result_meta_xdr.as_deref() {
		let meta = TransactionMeta::from_xdr_base64(meta, Limits::none())?;
		parsed.return_value = return_value(&meta);
	}
	if let Some(result) = parsed.result_xdr.as_deref() {
		let result = TransactionResult::from_xdr_base64(result, Limits::none())?;
		parsed.result_code = Some(result_code(&result));
	}

	Ok(parsed)
}

fn return_value(meta: &TransactionMeta) -> Option<ScVal> {
	match meta {
		TransactionMeta::V3(v3) => v3.soroban_meta.as_ref().map(|m| m.return_value.clone()),
		TransactionMeta::V4(v4) => v4.soroban_meta.as_ref().and_then(|m| m.return_value.clone()),
		_ => None,
	}
}

/// Names the transaction result code and, for failed invocations, the
/// host function result.
fn result_code(result: &TransactionResult) -> String {
	let code = format!("{:?}", result.result.discriminant());
	let op_code = match &result.result {
		TransactionResultResult::TxFailed(ops) => ops.iter().find_map(|op| match op {
			OperationResult::OpInner(OperationResultTr::InvokeHostFunction(r))
				if !matches!(r, InvokeHostFunctionResult::Success(_)) =>
			{
				Some(format!("{:?}", r.discriminant()))
			},
			_ => None,
		}),
		_ => None,
	};
	match op_code {
		Some(op_code) => format!("{} ({})", code, op_code),
		None => code,
	}
}
