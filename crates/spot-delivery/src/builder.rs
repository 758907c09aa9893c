//! Transaction building and preparation.
//!
//! A transaction carries exactly one `InvokeHostFunction` operation calling
//! the contract method named by the [`ContractCallSpec`]. Preparation
//! simulates the transaction and attaches the resource footprint, auth
//! entries and resource fee the endpoint reports.

use crate::{DeliveryError, RpcInterface, SimulationResponse};
use spot_codec::{address_to_sc, encode_args, symbol, CodecError};
use spot_types::{truncate_id, ContractCallSpec, EndpointConfig};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use stellar_strkey::Strkey;
use stellar_xdr::curr::{
	HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
	Operation, OperationBody, Preconditions, ReadXdr, ScAddress, ScVal, SequenceNumber,
	SorobanAuthorizationEntry, SorobanTransactionData, TimeBounds, TimePoint, Transaction,
	TransactionEnvelope, TransactionExt, TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

/// A simulated transaction with resources attached, ready for signing.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
	pub envelope: TransactionEnvelope,
	/// Resource fee reported by simulation, already added to the fee.
	pub min_resource_fee: u64,
	/// Return value of the simulated call.
	pub return_value: Option<ScVal>,
}

/// Builds and prepares contract invocation transactions.
pub struct TransactionBuilder {
	rpc: Arc<dyn RpcInterface>,
	endpoint: EndpointConfig,
}

impl TransactionBuilder {
	pub fn new(rpc: Arc<dyn RpcInterface>, endpoint: EndpointConfig) -> Self {
		Self { rpc, endpoint }
	}

	/// Builds the unsigned transaction for `source`.
	///
	/// The account sequence is loaded right before building; the transaction
	/// uses the next sequence number, the configured base fee, and time
	/// bounds `[0, now + tx_timeout_seconds]`.
	pub async fn build_unsigned(
		&self,
		source: &str,
		spec: &ContractCallSpec,
	) -> Result<TransactionEnvelope, DeliveryError> {
		let args = encode_args(&spec.args)?;
		let account = self.rpc.get_account(source).await?;
		let sequence = account.sequence.checked_add(1).ok_or_else(|| {
			DeliveryError::Preparation(format!("sequence overflow for {}", source))
		})?;

		tracing::debug!(
			source = %truncate_id(source),
			sequence,
			method = %spec.method,
			"Building contract invocation"
		);

		let max_time = unix_now().saturating_add(self.endpoint.tx_timeout_seconds);
		compose_envelope(source, sequence, spec, args, self.endpoint.base_fee, max_time)
	}

	/// Simulates an unsigned envelope.
	///
	/// A simulation error or a required restore is a preparation failure.
	pub async fn simulate(
		&self,
		envelope: &TransactionEnvelope,
	) -> Result<SimulationResponse, DeliveryError> {
		let xdr = envelope
			.to_xdr_base64(Limits::none())
			.map_err(|e| DeliveryError::Xdr(format!("serialize envelope: {}", e)))?;
		let simulation = self.rpc.simulate_transaction(&xdr).await?;
		if let Some(failure) = simulation.failure() {
			return Err(DeliveryError::Preparation(failure));
		}
		Ok(simulation)
	}

	/// Builds, simulates and assembles a transaction ready for signing.
	pub async fn build(
		&self,
		source: &str,
		spec: &ContractCallSpec,
	) -> Result<PreparedTransaction, DeliveryError> {
		let envelope = self.build_unsigned(source, spec).await?;
		let simulation = self.simulate(&envelope).await?;
		let return_value = simulation
			.return_value
			.as_deref()
			.map(spot_codec::decode_base64)
			.transpose()?;
		let envelope = assemble(envelope, &simulation, self.endpoint.base_fee)?;

		Ok(PreparedTransaction {
			envelope,
			min_resource_fee: simulation.min_resource_fee,
			return_value,
		})
	}
}

/// Composes the unsigned envelope from already-encoded arguments.
pub fn compose_envelope(
	source: &str,
	sequence: i64,
	spec: &ContractCallSpec,
	args: Vec<ScVal>,
	fee: u32,
	max_time: u64,
) -> Result<TransactionEnvelope, DeliveryError> {
	let source_key = match Strkey::from_string(source) {
		Ok(Strkey::PublicKeyEd25519(pk)) => pk.0,
		_ => return Err(CodecError::InvalidAddress(source.to_string()).into()),
	};
	let contract_address = match address_to_sc(&spec.contract_id)? {
		address @ ScAddress::Contract(_) => address,
		_ => return Err(CodecError::InvalidAddress(spec.contract_id.clone()).into()),
	};

	let invoke = InvokeContractArgs {
		contract_address,
		function_name: symbol(&spec.method)?,
		args: args.try_into().map_err(|e| DeliveryError::Xdr(format!("args: {}", e)))?,
	};
	let operation = Operation {
		source_account: None,
		body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
			host_function: HostFunction::InvokeContract(invoke),
			auth: VecM::default(),
		}),
	};

	let tx = Transaction {
		source_account: MuxedAccount::Ed25519(Uint256(source_key)),
		fee,
		seq_num: SequenceNumber(sequence),
		cond: Preconditions::Time(TimeBounds {
			min_time: TimePoint(0),
			max_time: TimePoint(max_time),
		}),
		memo: Memo::None,
		operations: vec![operation]
			.try_into()
			.map_err(|e| DeliveryError::Xdr(format!("operations: {}", e)))?,
		ext: TransactionExt::V0,
	};

	Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
		tx,
		signatures: VecM::default(),
	}))
}

/// Applies simulation results to an unsigned envelope.
///
/// Sets the Soroban transaction data, replaces the invoke operation's auth
/// entries, and sets the fee to `base_fee + min_resource_fee`, capped at
/// `u32::MAX`.
pub fn assemble(
	envelope: TransactionEnvelope,
	simulation: &SimulationResponse,
	base_fee: u32,
) -> Result<TransactionEnvelope, DeliveryError> {
	let TransactionEnvelope::Tx(mut v1) = envelope else {
		return Err(DeliveryError::Xdr("expected a v1 transaction envelope".to_string()));
	};

	if let Some(data) = simulation.transaction_data.as_deref().filter(|d| !d.is_empty()) {
		let data = SorobanTransactionData::from_xdr_base64(data, Limits::none())
			.map_err(|e| DeliveryError::Preparation(format!("transaction data: {}", e)))?;
		v1.tx.ext = TransactionExt::V1(data);
	}

	let total_fee = u64::from(base_fee).saturating_add(simulation.min_resource_fee);
	v1.tx.fee = u32::try_from(total_fee).unwrap_or(u32::MAX);

	if !simulation.auth.is_empty() {
		let entries = simulation
			.auth
			.iter()
			.map(|entry| SorobanAuthorizationEntry::from_xdr_base64(entry, Limits::none()))
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| DeliveryError::Preparation(format!("auth entry: {}", e)))?;

		let mut operations = v1.tx.operations.to_vec();
		if let Some(Operation {
			body: OperationBody::InvokeHostFunction(op),
			..
		}) = operations.first_mut()
		{
			op.auth = entries
				.try_into()
				.map_err(|e| DeliveryError::Xdr(format!("auth entries: {}", e)))?;
		}
		v1.tx.operations = operations
			.try_into()
			.map_err(|e| DeliveryError::Xdr(format!("operations: {}", e)))?;
	}

	Ok(TransactionEnvelope::Tx(v1))
}

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}
