//! Typed operations over the SPOT event contract.
//!
//! Writes go through [`ContractInvocationService::invoke`] and turn a failed
//! ledger outcome into an error. Reads go through simulation, so they need
//! a funded source account but never submit anything.
//!
//! Every call made through one [`SpotContract`] observes its cancellation
//! token. A write cancelled after submission fails with `Cancelled` and
//! keeps the transaction hash.

use crate::invocation::{INVOKE, SIMULATE};
use crate::{ContractInvocationService, InvocationError, InvocationReceipt};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use spot_account::AccountService;
use spot_codec::{decode_as, decode_u32_vec, CodecError, DecodeRecord};
use spot_types::{
	truncate_id, ContractCallSpec, CreatorApproval, EventRecord, NativeValue, NewEvent, TypedArg,
	ValueKind,
};
use std::sync::Arc;
use stellar_xdr::curr::ScVal;
use tokio_util::sync::CancellationToken;

/// Events read at once by the aggregate listings. Each event costs several
/// simulations, so this bounds the load on the RPC endpoint.
pub const MAX_CONCURRENT_EVENT_READS: usize = 8;

/// A confirmed write and the value it returned, when it could be read.
#[derive(Debug, Clone)]
pub struct Confirmed<T> {
	pub receipt: InvocationReceipt,
	pub value: Option<T>,
}

/// Event details together with the number of tokens minted so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
	#[serde(flatten)]
	pub event: EventRecord,
	pub minted_count: u32,
}

/// An event a holder has claimed, with the holder's token id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimedEvent {
	#[serde(flatten)]
	pub event: EventRecord,
	pub minted_count: u32,
	pub token_id: Option<u32>,
}

/// Client for one deployed SPOT contract.
pub struct SpotContract {
	service: Arc<ContractInvocationService>,
	contract_id: String,
	cancel: CancellationToken,
}

impl SpotContract {
	pub fn new(service: Arc<ContractInvocationService>, contract_id: impl Into<String>) -> Self {
		Self {
			service,
			contract_id: contract_id.into(),
			cancel: CancellationToken::new(),
		}
	}

	/// Uses `cancel` for every call made through this client.
	pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn contract_id(&self) -> &str {
		&self.contract_id
	}

	fn call(&self, method: &str) -> ContractCallSpec {
		ContractCallSpec::new(self.contract_id.clone(), method)
	}

	async fn signer_address(
		&self,
		signer: &AccountService,
		method: &str,
	) -> Result<String, InvocationError> {
		signer
			.get_address()
			.await
			.map_err(|e| InvocationError::new(INVOKE, &self.call(method), e.into()))
	}

	async fn write(
		&self,
		signer: &AccountService,
		spec: ContractCallSpec,
	) -> Result<InvocationReceipt, InvocationError> {
		self.service
			.invoke_with_cancel(signer, &spec, &self.cancel)
			.await?
			.into_success()
	}

	async fn read<T>(
		&self,
		source: &AccountService,
		spec: ContractCallSpec,
		project: impl FnOnce(&ScVal) -> Result<T, CodecError>,
	) -> Result<T, InvocationError> {
		let value = self
			.service
			.simulate_value_with_cancel(source, &spec, &self.cancel)
			.await?;
		project(&value).map_err(|e| InvocationError::new(SIMULATE, &spec, e.into()))
	}

	/// Approves `creator` after an off-chain payment. `admin` signs and is
	/// passed as the operator.
	pub async fn approve_creator(
		&self,
		admin: &AccountService,
		creator: &str,
		payment_reference: &str,
	) -> Result<InvocationReceipt, InvocationError> {
		let operator = self.signer_address(admin, "approve_creator").await?;
		let spec = self.call("approve_creator").with_args([
			TypedArg::address(operator),
			TypedArg::address(creator),
			TypedArg::string(payment_reference),
		]);
		self.write(admin, spec).await
	}

	pub async fn revoke_creator_approval(
		&self,
		admin: &AccountService,
		creator: &str,
	) -> Result<InvocationReceipt, InvocationError> {
		let operator = self.signer_address(admin, "revoke_creator_approval").await?;
		let spec = self
			.call("revoke_creator_approval")
			.with_args([TypedArg::address(operator), TypedArg::address(creator)]);
		self.write(admin, spec).await
	}

	/// Creates an event with the signer as its creator.
	///
	/// The new event id is taken from the contract's return value. When that
	/// is not available the event count is read back instead, which is only
	/// accurate while no other event is created concurrently.
	pub async fn create_event(
		&self,
		creator: &AccountService,
		event: &NewEvent,
	) -> Result<Confirmed<u32>, InvocationError> {
		let creator_address = self.signer_address(creator, "create_event").await?;
		let spec = self.call("create_event").with_args([
			TypedArg::address(creator_address),
			TypedArg::string(event.event_name.clone()),
			TypedArg::u64(event.event_date),
			TypedArg::string(event.location.clone()),
			TypedArg::string(event.description.clone()),
			TypedArg::u32(event.max_poaps),
			TypedArg::u64(event.claim_start),
			TypedArg::u64(event.claim_end),
			TypedArg::string(event.metadata_uri.clone()),
			TypedArg::string(event.image_url.clone()),
		]);
		let receipt = self.write(creator, spec).await?;

		let value = match receipt.return_value().and_then(as_u32) {
			Some(id) => Some(id),
			None => match self.event_count(creator).await {
				Ok(count) => Some(count),
				Err(e) => {
					tracing::warn!(
						tx_hash = %truncate_id(receipt.transaction_hash.as_str()),
						error = %e,
						"Event created but its id could not be read"
					);
					None
				},
			},
		};
		Ok(Confirmed { receipt, value })
	}

	/// Mints the event token to `claimer`. `payer` signs and pays the fee.
	pub async fn claim(
		&self,
		payer: &AccountService,
		event_id: u32,
		claimer: &str,
	) -> Result<Confirmed<u32>, InvocationError> {
		let spec = self
			.call("claim")
			.with_args([TypedArg::u32(event_id), TypedArg::address(claimer)]);
		let receipt = self.write(payer, spec).await?;
		let value = receipt.return_value().and_then(as_u32);
		Ok(Confirmed { receipt, value })
	}

	pub async fn admin(&self, source: &AccountService) -> Result<String, InvocationError> {
		self.read(source, self.call("admin"), |v| {
			match decode_as(v, ValueKind::Address)? {
				NativeValue::Address(address) => Ok(address),
				other => Err(CodecError::Decode {
					expected: "address".to_string(),
					observed: other.kind_name().to_string(),
				}),
			}
		})
		.await
	}

	pub async fn event_count(&self, source: &AccountService) -> Result<u32, InvocationError> {
		self.read(source, self.call("event_count"), decode_u32).await
	}

	pub async fn all_event_ids(&self, source: &AccountService) -> Result<Vec<u32>, InvocationError> {
		self.read(source, self.call("get_all_events"), decode_u32_vec)
			.await
	}

	pub async fn event(
		&self,
		source: &AccountService,
		event_id: u32,
	) -> Result<EventRecord, InvocationError> {
		let spec = self.call("get_event").arg(TypedArg::u32(event_id));
		self.read(source, spec, EventRecord::decode_record).await
	}

	pub async fn minted_count(
		&self,
		source: &AccountService,
		event_id: u32,
	) -> Result<u32, InvocationError> {
		let spec = self.call("minted_count").arg(TypedArg::u32(event_id));
		self.read(source, spec, decode_u32).await
	}

	pub async fn has_claimed(
		&self,
		source: &AccountService,
		event_id: u32,
		address: &str,
	) -> Result<bool, InvocationError> {
		let spec = self
			.call("has_claimed")
			.with_args([TypedArg::u32(event_id), TypedArg::address(address)]);
		self.read(source, spec, |v| match decode_as(v, ValueKind::Bool)? {
			NativeValue::Bool(claimed) => Ok(claimed),
			other => Err(CodecError::Decode {
				expected: "bool".to_string(),
				observed: other.kind_name().to_string(),
			}),
		})
		.await
	}

	/// Token id `address` holds for the event. Fails if it holds none.
	pub async fn user_token_for_event(
		&self,
		source: &AccountService,
		event_id: u32,
		address: &str,
	) -> Result<u32, InvocationError> {
		let spec = self
			.call("get_user_poap_for_event")
			.with_args([TypedArg::u32(event_id), TypedArg::address(address)]);
		self.read(source, spec, decode_u32).await
	}

	pub async fn creator_approval(
		&self,
		source: &AccountService,
		creator: &str,
	) -> Result<Option<CreatorApproval>, InvocationError> {
		let spec = self
			.call("get_creator_approval")
			.arg(TypedArg::address(creator));
		self.read(source, spec, CreatorApproval::decode_optional)
			.await
	}

	/// Lists all events with their minted counts.
	///
	/// Events whose details cannot be read are logged and left out. The
	/// creator filter compares addresses case-insensitively. At most
	/// [`MAX_CONCURRENT_EVENT_READS`] events are read at a time and the
	/// result keeps the contract's event order.
	pub async fn list_events(
		&self,
		source: &AccountService,
		creator_filter: Option<&str>,
	) -> Result<Vec<EventSummary>, InvocationError> {
		let ids = self.all_event_ids(source).await?;

		let summaries: Vec<Option<EventSummary>> = stream::iter(ids)
			.map(|event_id| async move {
				let (event, minted) = futures::join!(
					self.event(source, event_id),
					self.minted_count(source, event_id)
				);
				match (event, minted) {
					(Ok(event), Ok(minted_count)) => Some(EventSummary {
						event,
						minted_count,
					}),
					(Err(e), _) | (_, Err(e)) => {
						tracing::warn!(event_id, error = %e, "Skipping unreadable event");
						None
					},
				}
			})
			.buffered(MAX_CONCURRENT_EVENT_READS)
			.collect()
			.await;

		Ok(summaries
			.into_iter()
			.flatten()
			.filter(|summary| {
				creator_filter.is_none_or(|creator| summary.event.creator.eq_ignore_ascii_case(creator))
			})
			.collect())
	}

	/// Lists the events `claimer` holds a token for.
	pub async fn claimed_events(
		&self,
		source: &AccountService,
		claimer: &str,
	) -> Result<Vec<ClaimedEvent>, InvocationError> {
		let ids = self.all_event_ids(source).await?;

		let claimed: Vec<Option<ClaimedEvent>> = stream::iter(ids)
			.map(|event_id| self.claimed_event(source, event_id, claimer))
			.buffered(MAX_CONCURRENT_EVENT_READS)
			.collect()
			.await;

		Ok(claimed.into_iter().flatten().collect())
	}

	async fn claimed_event(
		&self,
		source: &AccountService,
		event_id: u32,
		claimer: &str,
	) -> Option<ClaimedEvent> {
		match self.has_claimed(source, event_id, claimer).await {
			Ok(true) => {},
			Ok(false) => return None,
			Err(e) => {
				tracing::warn!(event_id, error = %e, "Skipping event, claim status unreadable");
				return None;
			},
		}

		let (event, minted, token) = futures::join!(
			self.event(source, event_id),
			self.minted_count(source, event_id),
			self.user_token_for_event(source, event_id, claimer)
		);
		let token_id = match token {
			Ok(id) => Some(id),
			Err(e) => {
				tracing::debug!(event_id, error = %e, "Token id lookup failed");
				None
			},
		};
		match (event, minted) {
			(Ok(event), Ok(minted_count)) => Some(ClaimedEvent {
				event,
				minted_count,
				token_id,
			}),
			(Err(e), _) | (_, Err(e)) => {
				tracing::warn!(event_id, error = %e, "Skipping unreadable event");
				None
			},
		}
	}
}

fn decode_u32(value: &ScVal) -> Result<u32, CodecError> {
	match decode_as(value, ValueKind::U32)? {
		NativeValue::U32(n) => Ok(n),
		other => Err(CodecError::Decode {
			expected: "u32".to_string(),
			observed: other.kind_name().to_string(),
		}),
	}
}

fn as_u32(value: &NativeValue) -> Option<u32> {
	match value {
		NativeValue::U32(n) => Some(*n),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::*;
	use crate::InvocationErrorKind;
	use async_trait::async_trait;
	use spot_codec::{address_to_sc, decode, symbol};
	use spot_delivery::{
		AccountInfo, MockRpcInterface, RpcError, RpcInterface, SendTransactionResponse,
		SimulationResponse, TransactionStatusResponse,
	};
	use spot_types::{EndpointConfig, TransactionHash};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;
	use std::time::Duration;
	use stellar_xdr::curr::{ScMap, ScMapEntry, ScString, ScVec};

	/// Delays every simulation and records the most simulations in flight.
	struct SlowSimulations {
		inner: MockRpcInterface,
		in_flight: AtomicUsize,
		max_in_flight: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl RpcInterface for SlowSimulations {
		async fn get_account(&self, address: &str) -> Result<AccountInfo, RpcError> {
			self.inner.get_account(address).await
		}

		async fn simulate_transaction(
			&self,
			envelope_xdr: &str,
		) -> Result<SimulationResponse, RpcError> {
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.max_in_flight.fetch_max(now, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(50)).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			self.inner.simulate_transaction(envelope_xdr).await
		}

		async fn send_transaction(
			&self,
			envelope_xdr: &str,
		) -> Result<SendTransactionResponse, RpcError> {
			self.inner.send_transaction(envelope_xdr).await
		}

		async fn get_transaction(
			&self,
			hash: &TransactionHash,
		) -> Result<TransactionStatusResponse, RpcError> {
			self.inner.get_transaction(hash).await
		}

		async fn get_transaction_raw(
			&self,
			hash: &TransactionHash,
		) -> Result<TransactionStatusResponse, RpcError> {
			self.inner.get_transaction_raw(hash).await
		}
	}

	fn account(n: u8) -> String {
		format!("{}", stellar_strkey::ed25519::PublicKey([n; 32]))
	}

	fn contract(rpc: MockRpcInterface) -> SpotContract {
		SpotContract::new(Arc::new(service(rpc)), contract_id())
	}

	fn text(s: &str) -> ScVal {
		ScVal::String(ScString(s.try_into().unwrap()))
	}

	fn event_value(event_id: u32, creator: &str) -> ScVal {
		let entries = vec![
			("claim_end", ScVal::U64(2_000)),
			("claim_start", ScVal::U64(1_000)),
			("creator", ScVal::Address(address_to_sc(creator).unwrap())),
			("description", text("Meetup")),
			("event_date", ScVal::U64(1_500)),
			("event_id", ScVal::U32(event_id)),
			("event_name", text(&format!("Event {}", event_id))),
			("image_url", text("https://img")),
			("location", text("Quito")),
			("max_poaps", ScVal::U32(100)),
			("metadata_uri", text("ipfs://meta")),
		];
		let entries: Vec<ScMapEntry> = entries
			.into_iter()
			.map(|(key, val)| ScMapEntry {
				key: ScVal::Symbol(symbol(key).unwrap()),
				val,
			})
			.collect();
		ScVal::Map(Some(ScMap(entries.try_into().unwrap())))
	}

	fn ids(ids: &[u32]) -> ScVal {
		let items: Vec<ScVal> = ids.iter().map(|id| ScVal::U32(*id)).collect();
		ScVal::Vec(Some(ScVec(items.try_into().unwrap())))
	}

	fn arg_u32(args: &[ScVal], index: usize) -> u32 {
		match args[index] {
			ScVal::U32(n) => n,
			ref other => panic!("expected u32 argument, got {:?}", other),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_approve_creator_end_to_end() {
		let admin = signer_account().public_address().to_string();
		let creator = account(7);
		let seen: Arc<Mutex<Vec<(String, Vec<ScVal>)>>> = Arc::default();

		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		let recorded = seen.clone();
		expect_simulation_by_method(&mut rpc, move |method, args| {
			recorded
				.lock()
				.unwrap()
				.push((method.to_string(), args.to_vec()));
			Some(ScVal::Void)
		});
		let sent: Arc<Mutex<Option<String>>> = Arc::default();
		let sent_xdr = sent.clone();
		rpc.expect_send_transaction().times(1).returning(move |xdr| {
			*sent_xdr.lock().unwrap() = Some(xdr.to_string());
			Ok(spot_delivery::SendTransactionResponse {
				hash: TX_HASH.to_string(),
				status: "PENDING".to_string(),
				..Default::default()
			})
		});
		rpc.expect_get_transaction()
			.times(1)
			.returning(|_| Ok(TransactionStatusResponse::success(321, Some(ScVal::Void))));

		let receipt = contract(rpc)
			.approve_creator(&signer(), &creator, "pay-001")
			.await
			.unwrap();

		let calls = seen.lock().unwrap();
		assert_eq!(calls.len(), 1);
		let (method, args) = &calls[0];
		assert_eq!(method, "approve_creator");
		let args: Vec<NativeValue> = args.iter().map(|a| decode(a).unwrap()).collect();
		assert_eq!(
			args,
			vec![
				NativeValue::Address(admin),
				NativeValue::Address(creator),
				NativeValue::String("pay-001".to_string()),
			]
		);

		assert_eq!(receipt.transaction_hash, TransactionHash::new(TX_HASH));
		assert_eq!(
			sent.lock().unwrap().as_deref(),
			Some(receipt.signed_envelope_xdr.as_str())
		);
		assert_eq!(receipt.return_value(), Some(&NativeValue::Void));
	}

	#[tokio::test(start_paused = true)]
	async fn test_failed_write_is_transaction_failed() {
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation(&mut rpc, Some(ScVal::Void));
		expect_send(&mut rpc, "PENDING");
		rpc.expect_get_transaction().times(1).returning(|_| {
			let mut response = TransactionStatusResponse::failed();
			response.result_xdr = Some("AAAAAAAAAGT////zAAAAAA==".to_string());
			Ok(response)
		});

		let err = contract(rpc)
			.revoke_creator_approval(&signer(), &account(7))
			.await
			.unwrap_err();

		assert!(matches!(err.kind, InvocationErrorKind::TransactionFailed { .. }));
		assert_eq!(err.method, "revoke_creator_approval");
		assert!(err.transaction_hash.is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn test_create_event_returns_new_id() {
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation_by_method(&mut rpc, |method, args| {
			assert_eq!(method, "create_event");
			assert_eq!(args.len(), 10);
			assert_eq!(args[5], ScVal::U32(50));
			Some(ScVal::U32(12))
		});
		expect_send(&mut rpc, "PENDING");
		rpc.expect_get_transaction()
			.times(1)
			.returning(|_| Ok(TransactionStatusResponse::success(5, Some(ScVal::U32(12)))));

		let event = NewEvent {
			event_name: "Launch".to_string(),
			event_date: 1_700_000_000,
			location: "Online".to_string(),
			description: "Launch party".to_string(),
			max_poaps: 50,
			claim_start: 1_700_000_000,
			claim_end: 1_700_086_400,
			metadata_uri: "ipfs://x".to_string(),
			image_url: "https://x".to_string(),
		};
		let created = contract(rpc).create_event(&signer(), &event).await.unwrap();

		assert_eq!(created.value, Some(12));
	}

	#[tokio::test(start_paused = true)]
	async fn test_create_event_reads_count_when_id_missing() {
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation_by_method(&mut rpc, |method, _| match method {
			"create_event" => Some(ScVal::Void),
			"event_count" => Some(ScVal::U32(4)),
			other => panic!("unexpected call {}", other),
		});
		expect_send(&mut rpc, "PENDING");
		rpc.expect_get_transaction()
			.times(1)
			.returning(|_| Ok(TransactionStatusResponse::success(5, None)));

		let event = NewEvent {
			event_name: "Launch".to_string(),
			event_date: 1,
			location: String::new(),
			description: String::new(),
			max_poaps: 1,
			claim_start: 1,
			claim_end: 2,
			metadata_uri: String::new(),
			image_url: String::new(),
		};
		let created = contract(rpc).create_event(&signer(), &event).await.unwrap();

		assert_eq!(created.value, Some(4));
	}

	#[tokio::test(start_paused = true)]
	async fn test_claim_mints_to_claimer() {
		let claimer = account(3);
		let expected = claimer.clone();
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation_by_method(&mut rpc, move |method, args| {
			assert_eq!(method, "claim");
			assert_eq!(arg_u32(args, 0), 2);
			assert_eq!(decode(&args[1]).unwrap(), NativeValue::Address(expected.clone()));
			Some(ScVal::U32(77))
		});
		expect_send(&mut rpc, "PENDING");
		rpc.expect_get_transaction()
			.times(1)
			.returning(|_| Ok(TransactionStatusResponse::success(9, Some(ScVal::U32(77)))));

		let claimed = contract(rpc).claim(&signer(), 2, &claimer).await.unwrap();

		assert_eq!(claimed.value, Some(77));
		assert!(claimed.receipt.is_success());
	}

	#[tokio::test]
	async fn test_reads_decode_typed_values() {
		let admin = account(1);
		let admin_value = ScVal::Address(address_to_sc(&admin).unwrap());
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation_by_method(&mut rpc, move |method, _| match method {
			"admin" => Some(admin_value.clone()),
			"event_count" => Some(ScVal::U32(3)),
			"get_all_events" => Some(ids(&[1, 2, 3])),
			"minted_count" => Some(ScVal::U32(10)),
			"has_claimed" => Some(ScVal::Bool(true)),
			"get_user_poap_for_event" => Some(ScVal::U32(5)),
			"get_creator_approval" => Some(ScVal::Void),
			other => panic!("unexpected call {}", other),
		});
		rpc.expect_send_transaction().never();

		let spot = contract(rpc);
		let source = signer();
		assert_eq!(spot.admin(&source).await.unwrap(), admin);
		assert_eq!(spot.event_count(&source).await.unwrap(), 3);
		assert_eq!(spot.all_event_ids(&source).await.unwrap(), vec![1, 2, 3]);
		assert_eq!(spot.minted_count(&source, 1).await.unwrap(), 10);
		assert!(spot.has_claimed(&source, 1, &account(4)).await.unwrap());
		assert_eq!(spot.user_token_for_event(&source, 1, &account(4)).await.unwrap(), 5);
		assert_eq!(spot.creator_approval(&source, &account(4)).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_wrong_value_shape_is_decode_error() {
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation(&mut rpc, Some(ScVal::Bool(true)));

		let err = contract(rpc).event_count(&signer()).await.unwrap_err();

		assert!(matches!(err.kind, InvocationErrorKind::Decode(_)));
		assert_eq!(err.method, "event_count");
	}

	#[tokio::test]
	async fn test_list_events_skips_unreadable_and_filters_creator() {
		let alice = account(10);
		let bob = account(11);
		let (a, b) = (alice.clone(), bob.clone());
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation_by_method(&mut rpc, move |method, args| match method {
			"get_all_events" => Some(ids(&[1, 2, 3])),
			"get_event" => match arg_u32(args, 0) {
				1 => Some(event_value(1, &a)),
				// Event 2 cannot be read.
				2 => None,
				_ => Some(event_value(3, &b)),
			},
			"minted_count" => Some(ScVal::U32(arg_u32(args, 0) * 10)),
			other => panic!("unexpected call {}", other),
		});

		let spot = contract(rpc);
		let all = spot.list_events(&signer(), None).await.unwrap();
		let listed: Vec<(u32, u32)> = all
			.iter()
			.map(|s| (s.event.event_id, s.minted_count))
			.collect();
		assert_eq!(listed, vec![(1, 10), (3, 30)]);

		let filtered = spot
			.list_events(&signer(), Some(&bob.to_lowercase()))
			.await
			.unwrap();
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].event.creator, bob);
	}

	#[tokio::test]
	async fn test_claimed_events_tolerates_missing_token() {
		let holder = account(20);
		let creator = account(21);
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation_by_method(&mut rpc, move |method, args| match method {
			"get_all_events" => Some(ids(&[1, 2])),
			"has_claimed" => Some(ScVal::Bool(arg_u32(args, 0) == 1)),
			"get_event" => Some(event_value(arg_u32(args, 0), &creator)),
			"minted_count" => Some(ScVal::U32(1)),
			"get_user_poap_for_event" => None,
			other => panic!("unexpected call {}", other),
		});

		let claimed = contract(rpc)
			.claimed_events(&signer(), &holder)
			.await
			.unwrap();

		assert_eq!(claimed.len(), 1);
		assert_eq!(claimed[0].event.event_id, 1);
		assert_eq!(claimed[0].token_id, None);
	}

	#[tokio::test(start_paused = true)]
	async fn test_list_events_bounds_concurrent_reads() {
		let creator = account(12);
		let all: Vec<u32> = (1..=200).collect();
		let listed_ids = all.clone();
		let mut inner = MockRpcInterface::new();
		expect_account(&mut inner);
		expect_simulation_by_method(&mut inner, move |method, args| match method {
			"get_all_events" => Some(ids(&listed_ids)),
			"get_event" => Some(event_value(arg_u32(args, 0), &creator)),
			"minted_count" => Some(ScVal::U32(0)),
			other => panic!("unexpected call {}", other),
		});

		let max_in_flight = Arc::new(AtomicUsize::new(0));
		let rpc = SlowSimulations {
			inner,
			in_flight: AtomicUsize::new(0),
			max_in_flight: max_in_flight.clone(),
		};
		let service = ContractInvocationService::new(
			Arc::new(rpc),
			EndpointConfig::testnet("http://localhost:8000"),
		);
		let spot = SpotContract::new(Arc::new(service), contract_id());

		let events = spot.list_events(&signer(), None).await.unwrap();

		let listed: Vec<u32> = events.iter().map(|s| s.event.event_id).collect();
		assert_eq!(listed, all);
		// Two simulations per event: details and minted count.
		let max = max_in_flight.load(Ordering::SeqCst);
		assert!(max <= 2 * MAX_CONCURRENT_EVENT_READS, "{} simulations in flight", max);
		assert!(max > 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancelled_write_keeps_hash() {
		let mut rpc = MockRpcInterface::new();
		expect_account(&mut rpc);
		expect_simulation(&mut rpc, Some(ScVal::U32(1)));
		expect_send(&mut rpc, "PENDING");
		rpc.expect_get_transaction()
			.returning(|_| Ok(TransactionStatusResponse::pending()));

		let cancel = CancellationToken::new();
		let spot = contract(rpc).with_cancellation(cancel.clone());
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_millis(2_500)).await;
			cancel.cancel();
		});

		let err = spot.claim(&signer(), 1, &account(3)).await.unwrap_err();

		assert!(matches!(err.kind, InvocationErrorKind::Cancelled));
		assert_eq!(err.method, "claim");
		assert_eq!(err.transaction_hash, Some(TransactionHash::new(TX_HASH)));
	}

	#[test]
	fn test_summary_json_is_flat() {
		let summary = EventSummary {
			event: EventRecord {
				event_id: 1,
				creator: account(1),
				event_name: "E".to_string(),
				event_date: u64::MAX,
				location: String::new(),
				description: String::new(),
				max_poaps: 5,
				claim_start: 0,
				claim_end: 0,
				metadata_uri: String::new(),
				image_url: String::new(),
			},
			minted_count: 2,
		};
		let json = serde_json::to_value(&summary).unwrap();
		assert_eq!(json["event_id"], 1);
		assert_eq!(json["minted_count"], 2);
		assert_eq!(json["event_date"], "18446744073709551615");
	}
}
