//! Local ed25519 signer.
//!
//! Holds a Stellar secret seed in memory and signs envelopes in-process.

use crate::{AccountError, AccountInterface, SignedEnvelope};
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use spot_types::{truncate_id, SecretString};
use stellar_strkey::Strkey;
use stellar_xdr::curr::{DecoratedSignature, Signature, SignatureHint, TransactionEnvelope};

/// Implementation name used in account configuration.
pub const NAME: &str = "local";

/// Signer backed by an in-memory ed25519 key.
pub struct LocalAccount {
	signing_key: SigningKey,
	address: String,
}

impl LocalAccount {
	/// Creates a signer from a Stellar secret seed (`S...`).
	///
	/// Malformed or non-secret strkeys are rejected here, before any network
	/// use.
	pub fn from_secret(secret: &SecretString) -> Result<Self, AccountError> {
		secret.with_exposed(|s| match Strkey::from_string(s.trim()) {
			Ok(Strkey::PrivateKeyEd25519(sk)) => Ok(Self::from_seed(sk.0)),
			Ok(_) => Err(AccountError::InvalidKey(
				"expected an S... secret seed".to_string(),
			)),
			Err(_) => Err(AccountError::InvalidKey(
				"secret seed is not a valid strkey".to_string(),
			)),
		})
	}

	/// Creates a signer from raw ed25519 seed bytes.
	pub fn from_seed(seed: [u8; 32]) -> Self {
		let signing_key = SigningKey::from_bytes(&seed);
		let public = signing_key.verifying_key().to_bytes();
		let address = format!("{}", stellar_strkey::ed25519::PublicKey(public));
		Self {
			signing_key,
			address,
		}
	}

	/// The signer's `G...` address.
	pub fn public_address(&self) -> &str {
		&self.address
	}

	fn hint(&self) -> SignatureHint {
		let public = self.signing_key.verifying_key().to_bytes();
		SignatureHint([public[28], public[29], public[30], public[31]])
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	async fn address(&self) -> Result<String, AccountError> {
		Ok(self.address.clone())
	}

	async fn sign_envelope(
		&self,
		envelope: TransactionEnvelope,
		network_passphrase: &str,
	) -> Result<SignedEnvelope, AccountError> {
		let TransactionEnvelope::Tx(mut v1) = envelope else {
			return Err(AccountError::SigningFailed(
				"expected a v1 transaction envelope".to_string(),
			));
		};

		let hash = crate::transaction_hash(&v1.tx, network_passphrase)?;
		let signature = self.signing_key.sign(&hash);

		let decorated = DecoratedSignature {
			hint: self.hint(),
			signature: Signature(
				signature
					.to_bytes()
					.to_vec()
					.try_into()
					.map_err(|e| AccountError::SigningFailed(format!("signature: {}", e)))?,
			),
		};

		let mut signatures = v1.signatures.to_vec();
		signatures.push(decorated);
		v1.signatures = signatures
			.try_into()
			.map_err(|e| AccountError::SigningFailed(format!("signatures: {}", e)))?;

		let signed = SignedEnvelope::new(TransactionEnvelope::Tx(v1), hash)?;
		tracing::debug!(
			signer = %truncate_id(&self.address),
			tx_hash = %truncate_id(&signed.hash),
			"Signed transaction envelope"
		);
		Ok(signed)
	}
}

/// Factory function to create a local account from a secret seed (`S...`).
pub fn create_account(secret: &SecretString) -> Result<Box<dyn AccountInterface>, AccountError> {
	if secret.is_empty() {
		return Err(AccountError::InvalidKey("secret is required".to_string()));
	}
	Ok(Box::new(LocalAccount::from_secret(secret)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{transaction_hash, AccountService};
	use ed25519_dalek::Verifier;
	use stellar_xdr::curr::{
		ContractId, Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Memo,
		MuxedAccount, Operation, OperationBody, Preconditions, ScAddress, ScSymbol, ScVal,
		SequenceNumber, Transaction, TransactionExt, TransactionV1Envelope, Uint256, VecM,
	};

	const PASSPHRASE: &str = "Test SDF Network ; September 2015";

	fn secret_for(seed: [u8; 32]) -> SecretString {
		SecretString::from(format!(
			"{}",
			stellar_strkey::ed25519::PrivateKey(seed)
		))
	}

	fn envelope(seq: i64) -> TransactionEnvelope {
		let op = Operation {
			source_account: None,
			body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
				host_function: HostFunction::InvokeContract(InvokeContractArgs {
					contract_address: ScAddress::Contract(ContractId(Hash([0u8; 32]))),
					function_name: ScSymbol("claim".try_into().unwrap()),
					args: vec![ScVal::U32(1)].try_into().unwrap(),
				}),
				auth: VecM::default(),
			}),
		};
		TransactionEnvelope::Tx(TransactionV1Envelope {
			tx: Transaction {
				source_account: MuxedAccount::Ed25519(Uint256([0u8; 32])),
				fee: 100,
				seq_num: SequenceNumber(seq),
				cond: Preconditions::None,
				memo: Memo::None,
				operations: vec![op].try_into().unwrap(),
				ext: TransactionExt::V0,
			},
			signatures: VecM::default(),
		})
	}

	#[test]
	fn test_from_secret_derives_address() {
		let account = LocalAccount::from_secret(&secret_for([1u8; 32])).unwrap();
		assert!(account.public_address().starts_with('G'));
		assert_eq!(account.public_address().len(), 56);
	}

	#[test]
	fn test_invalid_secret_fails_fast() {
		let err = LocalAccount::from_secret(&SecretString::from("SNOTAKEY")).err().unwrap();
		assert!(matches!(err, AccountError::InvalidKey(_)));

		// A public key is not a secret.
		let public = LocalAccount::from_seed([2u8; 32]).public_address().to_string();
		let err = LocalAccount::from_secret(&SecretString::from(public)).err().unwrap();
		assert!(matches!(err, AccountError::InvalidKey(_)));
	}

	#[test]
	fn test_error_does_not_echo_secret() {
		let err = LocalAccount::from_secret(&SecretString::from("SBADSECRETVALUE")).err().unwrap();
		assert!(!err.to_string().contains("SBADSECRETVALUE"));
	}

	#[tokio::test]
	async fn test_sign_is_deterministic_and_verifies() {
		let account = LocalAccount::from_seed([3u8; 32]);
		let first = account.sign_envelope(envelope(7), PASSPHRASE).await.unwrap();
		let second = account.sign_envelope(envelope(7), PASSPHRASE).await.unwrap();
		assert_eq!(first.xdr, second.xdr);
		assert_eq!(first.hash, second.hash);

		let TransactionEnvelope::Tx(v1) = &first.envelope else {
			panic!("expected v1 envelope");
		};
		assert_eq!(v1.signatures.len(), 1);

		let verifying = account.signing_key.verifying_key();
		let hash = transaction_hash(&v1.tx, PASSPHRASE).unwrap();
		assert_eq!(hex::encode(hash), first.hash);
		let sig = ed25519_dalek::Signature::from_slice(&v1.signatures[0].signature.0.to_vec()).unwrap();
		assert!(verifying.verify(&hash, &sig).is_ok());
		assert_eq!(v1.signatures[0].hint.0.to_vec(), verifying.to_bytes()[28..32].to_vec());
	}

	#[tokio::test]
	async fn test_hash_depends_on_passphrase() {
		let account = LocalAccount::from_seed([3u8; 32]);
		let testnet = account.sign_envelope(envelope(1), PASSPHRASE).await.unwrap();
		let other = account
			.sign_envelope(envelope(1), "Public Global Stellar Network ; September 2015")
			.await
			.unwrap();
		assert_ne!(testnet.hash, other.hash);
	}

	#[tokio::test]
	async fn test_factory_and_service() {
		let service = AccountService::new(
			crate::create_account(NAME, &secret_for([4u8; 32])).unwrap(),
		);
		let expected = LocalAccount::from_seed([4u8; 32]).public_address().to_string();
		assert_eq!(service.get_address().await.unwrap(), expected);

		let missing = create_account(&SecretString::from("  "));
		assert!(matches!(missing, Err(AccountError::InvalidKey(_))));

		let unknown = crate::create_account("kms", &secret_for([4u8; 32]));
		assert!(matches!(unknown, Err(AccountError::InvalidKey(ref m)) if m.contains("kms")));
	}
}
