//! Subcommands and their JSON output.
//!
//! Every state-changing command writes one audit record under the
//! `spot::audit` target, whether it succeeds or not. The record carries the
//! action, the request payload, the transaction hash and the signed
//! envelope when one was submitted.

use clap::Subcommand;
use serde_json::{json, Value};
use spot_account::AccountService;
use spot_core::{
	Confirmed, InvocationError, InvocationErrorKind, InvocationOutcome, InvocationReceipt,
	SpotContract,
};
use spot_types::{NativeValue, NewEvent};
use std::future::Future;

/// Signers used by the commands.
pub struct Signers {
	/// Signs approvals, revocations and event creation; also the source of
	/// read-only simulations.
	pub admin: AccountService,
	/// Pays for claims.
	pub claim_payer: AccountService,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Approve a creator after an off-chain payment
	ApproveCreator {
		#[arg(long)]
		creator: String,
		#[arg(long)]
		payment_reference: String,
	},
	/// Revoke a creator's approval
	RevokeCreator {
		#[arg(long)]
		creator: String,
	},
	/// Create an event with the admin as creator
	CreateEvent {
		#[arg(long)]
		name: String,
		/// Event date as a unix timestamp
		#[arg(long)]
		date: u64,
		#[arg(long)]
		location: String,
		#[arg(long, default_value = "")]
		description: String,
		#[arg(long)]
		max_poaps: u32,
		#[arg(long)]
		claim_start: u64,
		#[arg(long)]
		claim_end: u64,
		#[arg(long, default_value = "")]
		metadata_uri: String,
		#[arg(long, default_value = "")]
		image_url: String,
	},
	/// Mint an event token to a claimer, paid by the claim payer
	Claim {
		#[arg(long)]
		event_id: u32,
		#[arg(long)]
		claimer: String,
	},
	/// Show the contract admin
	Admin,
	/// Show the number of events created
	EventCount,
	/// List events with their minted counts
	Events {
		/// Only list events by this creator
		#[arg(long)]
		creator: Option<String>,
	},
	/// Show one event
	Event {
		#[arg(long)]
		event_id: u32,
	},
	/// Show how many tokens an event has minted
	MintedCount {
		#[arg(long)]
		event_id: u32,
	},
	/// Check whether an address has claimed an event
	HasClaimed {
		#[arg(long)]
		event_id: u32,
		#[arg(long)]
		address: String,
	},
	/// List the events an address has claimed
	Claimed {
		#[arg(long)]
		address: String,
	},
	/// Show a creator's approval record
	CreatorApproval {
		#[arg(long)]
		creator: String,
	},
}

/// Runs one command and returns its JSON result.
pub async fn run(
	command: Command,
	spot: &SpotContract,
	signers: &Signers,
) -> Result<Value, InvocationError> {
	let source = &signers.admin;

	match command {
		Command::ApproveCreator {
			creator,
			payment_reference,
		} => {
			let payload = json!({ "creator": creator, "payment_reference": payment_reference });
			audited("approve_creator", payload, None, async {
				let receipt = spot
					.approve_creator(&signers.admin, &creator, &payment_reference)
					.await?;
				Ok(Confirmed { receipt, value: None })
			})
			.await
		},
		Command::RevokeCreator { creator } => {
			let payload = json!({ "creator": creator });
			audited("revoke_creator_approval", payload, None, async {
				let receipt = spot.revoke_creator_approval(&signers.admin, &creator).await?;
				Ok(Confirmed { receipt, value: None })
			})
			.await
		},
		Command::CreateEvent {
			name,
			date,
			location,
			description,
			max_poaps,
			claim_start,
			claim_end,
			metadata_uri,
			image_url,
		} => {
			let event = NewEvent {
				event_name: name,
				event_date: date,
				location,
				description,
				max_poaps,
				claim_start,
				claim_end,
				metadata_uri,
				image_url,
			};
			let payload = serde_json::to_value(&event).unwrap_or(Value::Null);
			audited(
				"create_event",
				payload,
				Some("event_id"),
				spot.create_event(&signers.admin, &event),
			)
			.await
		},
		Command::Claim { event_id, claimer } => {
			let payload = json!({ "event_id": event_id, "claimer": claimer });
			audited(
				"claim",
				payload,
				Some("token_id"),
				spot.claim(&signers.claim_payer, event_id, &claimer),
			)
			.await
		},
		Command::Admin => Ok(json!({ "admin": spot.admin(source).await? })),
		Command::EventCount => Ok(json!({ "event_count": spot.event_count(source).await? })),
		Command::Events { creator } => {
			let events = spot.list_events(source, creator.as_deref()).await?;
			Ok(json!({ "events": events }))
		},
		Command::Event { event_id } => Ok(json!(spot.event(source, event_id).await?)),
		Command::MintedCount { event_id } => Ok(json!({
			"event_id": event_id,
			"minted_count": spot.minted_count(source, event_id).await?,
		})),
		Command::HasClaimed { event_id, address } => Ok(json!({
			"event_id": event_id,
			"address": address,
			"has_claimed": spot.has_claimed(source, event_id, &address).await?,
		})),
		Command::Claimed { address } => {
			let events = spot.claimed_events(source, &address).await?;
			Ok(json!({ "address": address, "events": events }))
		},
		Command::CreatorApproval { creator } => Ok(json!({
			"creator": creator,
			"approval": spot.creator_approval(source, &creator).await?,
		})),
	}
}

/// Runs a write and records the audit entry for it.
async fn audited<F>(
	action: &'static str,
	payload: Value,
	value_key: Option<&str>,
	write: F,
) -> Result<Value, InvocationError>
where
	F: Future<Output = Result<Confirmed<u32>, InvocationError>>,
{
	match write.await {
		Ok(confirmed) => {
			tracing::info!(
				target: "spot::audit",
				action,
				status = "success",
				tx_hash = %confirmed.receipt.transaction_hash,
				submission_status = %confirmed.receipt.submission_status,
				payload = %payload,
				signed_envelope = %confirmed.receipt.signed_envelope_xdr,
				"Contract invocation confirmed"
			);
			let mut output = receipt_json(&confirmed.receipt);
			if let Some(key) = value_key {
				output[key] = json!(confirmed.value);
			}
			Ok(output)
		},
		Err(err) => {
			tracing::warn!(
				target: "spot::audit",
				action,
				status = audit_status(&err),
				tx_hash = ?err.transaction_hash.as_ref().map(|h| h.as_str()),
				payload = %payload,
				error = %err,
				"Contract invocation did not succeed"
			);
			Err(err)
		},
	}
}

/// Audit status for a failed write.
///
/// A timed out or interrupted call that was already submitted may still be
/// applied, so it is recorded as pending rather than failed.
fn audit_status(err: &InvocationError) -> &'static str {
	match (&err.kind, &err.transaction_hash) {
		(InvocationErrorKind::TimedOut { .. } | InvocationErrorKind::Cancelled, Some(_)) => {
			"pending"
		},
		_ => "failed",
	}
}

fn receipt_json(receipt: &InvocationReceipt) -> Value {
	let ledger = match &receipt.outcome {
		InvocationOutcome::Success { ledger, .. } => *ledger,
		InvocationOutcome::Failed { .. } => None,
	};
	json!({
		"contract_id": receipt.contract_id,
		"method": receipt.method,
		"tx_hash": receipt.transaction_hash,
		"submission_status": receipt.submission_status.to_string(),
		"ledger": ledger,
		"return_value": receipt.return_value().map(NativeValue::to_json),
	})
}
