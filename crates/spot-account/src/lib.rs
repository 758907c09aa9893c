//! Signer identities for SPOT contract invocations.
//!
//! This crate defines the interface a signer must provide (its `G...`
//! address and envelope signing) and the service wrapper the invocation
//! engine holds. Key material never leaves the implementation.

use async_trait::async_trait;
use spot_types::SecretString;
use thiserror::Error;

mod envelope;

pub use envelope::{transaction_hash, SignedEnvelope};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a secret key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Trait defining the interface for signer implementations.
///
/// Implementations hold the key material and sign transaction envelopes for
/// a specific network passphrase.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the signer's public address (`G...`).
	async fn address(&self) -> Result<String, AccountError>;

	/// Signs a transaction envelope for the given network.
	///
	/// The signature covers `SHA256(SHA256(passphrase) || ENVELOPE_TYPE_TX ||
	/// tx_xdr)` and is appended to the envelope's signatures.
	async fn sign_envelope(
		&self,
		envelope: stellar_xdr::curr::TransactionEnvelope,
		network_passphrase: &str,
	) -> Result<SignedEnvelope, AccountError>;
}

/// Type alias for account factory functions.
///
/// A factory builds a signer from its secret material and rejects malformed
/// secrets before the signer is used.
pub type AccountFactory = fn(&SecretString) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Returns the available account implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::NAME, local::create_account)]
}

/// Builds a signer with the named implementation.
pub fn create_account(
	implementation: &str,
	secret: &SecretString,
) -> Result<Box<dyn AccountInterface>, AccountError> {
	let factory = get_all_implementations()
		.into_iter()
		.find(|(name, _)| *name == implementation)
		.map(|(_, factory)| factory)
		.ok_or_else(|| {
			AccountError::InvalidKey(format!("unknown account implementation '{}'", implementation))
		})?;
	factory(secret)
}

/// Service that manages signing for one identity.
///
/// Wraps an account implementation so callers hold a concrete type while the
/// signer stays swappable.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address of the managed account.
	pub async fn get_address(&self) -> Result<String, AccountError> {
		self.implementation.address().await
	}

	/// Signs a transaction envelope with the managed account.
	pub async fn sign(
		&self,
		envelope: stellar_xdr::curr::TransactionEnvelope,
		network_passphrase: &str,
	) -> Result<SignedEnvelope, AccountError> {
		self.implementation
			.sign_envelope(envelope, network_passphrase)
			.await
	}
}
