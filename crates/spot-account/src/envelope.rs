use crate::AccountError;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{EnvelopeType, Limits, Transaction, TransactionEnvelope, WriteXdr};

/// A signed transaction ready for submission.
///
/// Holds the envelope, its canonical base64 XDR and the hex network hash.
/// Contains no key material, so it is safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
	pub envelope: TransactionEnvelope,
	/// Canonical base64 XDR of `envelope`.
	pub xdr: String,
	/// Hex-encoded network hash of the transaction.
	pub hash: String,
}

impl SignedEnvelope {
	pub fn new(envelope: TransactionEnvelope, hash: [u8; 32]) -> Result<Self, AccountError> {
		let xdr = envelope
			.to_xdr_base64(Limits::none())
			.map_err(|e| AccountError::SigningFailed(format!("serialize envelope: {}", e)))?;
		Ok(Self {
			envelope,
			xdr,
			hash: hex::encode(hash),
		})
	}
}

/// Computes the network hash a signer signs:
/// `SHA256(SHA256(passphrase) || ENVELOPE_TYPE_TX || tx_xdr)`.
pub fn transaction_hash(tx: &Transaction, network_passphrase: &str) -> Result<[u8; 32], AccountError> {
	let network_id: [u8; 32] = Sha256::digest(network_passphrase.as_bytes()).into();
	let tx_xdr = tx
		.to_xdr(Limits::none())
		.map_err(|e| AccountError::SigningFailed(format!("serialize tx: {}", e)))?;

	let mut hasher = Sha256::new();
	hasher.update(network_id);
	hasher.update((EnvelopeType::Tx as i32).to_be_bytes());
	hasher.update(&tx_xdr);
	Ok(hasher.finalize().into())
}
