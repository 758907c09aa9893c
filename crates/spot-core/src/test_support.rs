//! Mock RPC fixtures shared by the invocation and contract tests.

use crate::ContractInvocationService;
use spot_account::implementations::local::LocalAccount;
use spot_account::AccountService;
use spot_delivery::{AccountInfo, MockRpcInterface, SendTransactionResponse, SimulationResponse};
use spot_types::EndpointConfig;
use std::sync::Arc;
use stellar_xdr::curr::{
	HostFunction, Limits, OperationBody, ReadXdr, ScVal, TransactionEnvelope, WriteXdr,
};

pub const TX_HASH: &str = "5f1c0e9a7b3d2c4e6f8a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c0d1e";

pub fn contract_id() -> String {
	format!("{}", stellar_strkey::Contract([9u8; 32]))
}

pub fn signer_account() -> LocalAccount {
	LocalAccount::from_seed([1u8; 32])
}

pub fn signer() -> AccountService {
	AccountService::new(Box::new(signer_account()))
}

pub fn service(rpc: MockRpcInterface) -> ContractInvocationService {
	ContractInvocationService::new(Arc::new(rpc), EndpointConfig::testnet("http://localhost:8000"))
}

pub fn expect_account(rpc: &mut MockRpcInterface) {
	rpc.expect_get_account().returning(|address| {
		Ok(AccountInfo {
			account_id: address.to_string(),
			sequence: 41,
		})
	});
}

pub fn simulation(return_value: Option<ScVal>) -> SimulationResponse {
	SimulationResponse {
		min_resource_fee: 100,
		return_value: return_value.map(|v| v.to_xdr_base64(Limits::none()).unwrap()),
		latest_ledger: 50,
		..Default::default()
	}
}

pub fn expect_simulation(rpc: &mut MockRpcInterface, return_value: Option<ScVal>) {
	let response = simulation(return_value);
	rpc.expect_simulate_transaction()
		.returning(move |_| Ok(response.clone()));
}

/// Answers simulations by contract method name and arguments.
pub fn expect_simulation_by_method<F>(rpc: &mut MockRpcInterface, answer: F)
where
	F: Fn(&str, &[ScVal]) -> Option<ScVal> + Send + 'static,
{
	rpc.expect_simulate_transaction().returning(move |xdr| {
		let (method, args) = invoked(xdr);
		Ok(simulation(answer(&method, &args)))
	});
}

pub fn expect_send(rpc: &mut MockRpcInterface, status: &str) {
	let status = status.to_string();
	rpc.expect_send_transaction().times(1).returning(move |_| {
		Ok(SendTransactionResponse {
			hash: TX_HASH.to_string(),
			status: status.clone(),
			..Default::default()
		})
	});
}

/// Extracts the method name and arguments from an envelope's invoke operation.
pub fn invoked(envelope_xdr: &str) -> (String, Vec<ScVal>) {
	let envelope = TransactionEnvelope::from_xdr_base64(envelope_xdr, Limits::none()).unwrap();
	let TransactionEnvelope::Tx(v1) = envelope else {
		panic!("expected a v1 envelope");
	};
	let OperationBody::InvokeHostFunction(op) = &v1.tx.operations[0].body else {
		panic!("expected an invoke operation");
	};
	let HostFunction::InvokeContract(call) = &op.host_function else {
		panic!("expected a contract call");
	};
	(call.function_name.0.to_utf8_string().unwrap(), call.args.to_vec())
}
