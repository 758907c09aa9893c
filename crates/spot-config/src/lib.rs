//! Configuration for the SPOT invocation service.
//!
//! Configuration is TOML with three sections:
//!
//! - `[network]`: RPC endpoint, network passphrase, fee and polling parameters
//! - `[contract]`: address of the deployed SPOT contract
//! - `[accounts]`: signer implementation and secrets
//!
//! Values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`, which keeps secrets out of the files themselves.
//!
//! ## Modular Configuration Support
//!
//! A file may pull in others with `include = ["network.toml", ...]`. Each
//! top-level section must be defined in exactly one file.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use spot_types::{EndpointConfig, SecretString};
use std::path::Path;
use std::str::FromStr;
use stellar_strkey::Strkey;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The message alone; the default rendering echoes the input, which
		// may hold resolved secrets.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Soroban RPC endpoint and transaction parameters.
	pub network: EndpointConfig,
	pub contract: ContractConfig,
	pub accounts: AccountsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	/// Address of the deployed SPOT contract (`C...`).
	pub spot_contract_id: String,
}

/// Signer configuration.
///
/// The admin signs approvals and event creation. Claims are paid by the
/// claim payer, which defaults to the admin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountsConfig {
	/// Name of the account implementation used for every signer.
	#[serde(default = "default_account_implementation")]
	pub implementation: String,
	pub admin_secret: SecretString,
	#[serde(default)]
	pub claim_payer_secret: Option<SecretString>,
}

fn default_account_implementation() -> String {
	"local".to_string()
}

impl AccountsConfig {
	/// Secret used to sign claims.
	///
	/// An empty claim payer secret, as produced by `${VAR:-}` when the
	/// variable is unset, counts as absent.
	pub fn claim_payer(&self) -> &SecretString {
		match &self.claim_payer_secret {
			Some(secret) if !secret.is_empty() => secret,
			_ => &self.admin_secret,
		}
	}
}

/// Resolves `${VAR}` and `${VAR:-default}` references in the input.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut resolved = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					name.as_str()
				)));
			},
		};
		resolved.push_str(&input[last..whole.start()]);
		resolved.push_str(&value);
		last = whole.end();
	}
	resolved.push_str(&input[last..]);

	Ok(resolved)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Checks values serde cannot: URL scheme, non-zero timings, and the
	/// shape of the contract address and secrets.
	///
	/// Secret values never appear in the returned errors.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let network = &self.network;
		if !(network.rpc_url.starts_with("http://") || network.rpc_url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"network.rpc_url must be an http(s) URL, got '{}'",
				network.rpc_url
			)));
		}
		if network.network_passphrase.trim().is_empty() {
			return Err(ConfigError::Validation(
				"network.network_passphrase cannot be empty".into(),
			));
		}
		if network.base_fee == 0 {
			return Err(ConfigError::Validation("network.base_fee must be positive".into()));
		}
		if network.tx_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"network.tx_timeout_seconds must be positive".into(),
			));
		}
		if network.poll_interval_ms == 0 || network.poll_attempts == 0 {
			return Err(ConfigError::Validation(
				"network.poll_interval_ms and network.poll_attempts must be positive".into(),
			));
		}
		if network.request_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"network.request_timeout_seconds must be positive".into(),
			));
		}

		match Strkey::from_string(&self.contract.spot_contract_id) {
			Ok(Strkey::Contract(_)) => {},
			_ => {
				return Err(ConfigError::Validation(format!(
					"contract.spot_contract_id must be a C... contract address, got '{}'",
					self.contract.spot_contract_id
				)));
			},
		}

		if self.accounts.implementation.trim().is_empty() {
			return Err(ConfigError::Validation(
				"accounts.implementation cannot be empty".into(),
			));
		}
		validate_secret("accounts.admin_secret", &self.accounts.admin_secret)?;
		if let Some(secret) = &self.accounts.claim_payer_secret {
			if !secret.is_empty() {
				validate_secret("accounts.claim_payer_secret", secret)?;
			}
		}

		Ok(())
	}
}

fn validate_secret(field: &str, secret: &SecretString) -> Result<(), ConfigError> {
	if secret.is_empty() {
		return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
	}
	let valid = secret.with_exposed(|s| {
		matches!(Strkey::from_string(s.trim()), Ok(Strkey::PrivateKeyEd25519(_)))
	});
	if !valid {
		return Err(ConfigError::Validation(format!(
			"{} is not a valid S... secret seed",
			field
		)));
	}
	Ok(())
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
