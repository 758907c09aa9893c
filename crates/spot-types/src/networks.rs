//! RPC endpoint configuration.
//!
//! One [`EndpointConfig`] describes the Soroban RPC endpoint a service
//! instance talks to, the network passphrase it signs for, and the fee and
//! timing parameters used while building and confirming transactions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default inclusion fee in stroops, before resource fees are added.
pub const DEFAULT_BASE_FEE: u32 = 100;
/// Default upper time bound offset for built transactions.
pub const DEFAULT_TX_TIMEOUT_SECONDS: u64 = 30;
/// Default delay between confirmation polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Default number of confirmation polls before giving up.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 60;
/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Passphrase of the public Stellar test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Connection and tuning parameters for a Soroban RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
	/// JSON-RPC URL of the Soroban RPC server.
	pub rpc_url: String,
	/// Network passphrase mixed into every signature.
	pub network_passphrase: String,
	#[serde(default = "default_base_fee")]
	pub base_fee: u32,
	/// Seconds added to "now" for the transaction's max time bound.
	#[serde(default = "default_tx_timeout_seconds")]
	pub tx_timeout_seconds: u64,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default = "default_poll_attempts")]
	pub poll_attempts: u32,
	#[serde(default = "default_request_timeout_seconds")]
	pub request_timeout_seconds: u64,
}

fn default_base_fee() -> u32 {
	DEFAULT_BASE_FEE
}

fn default_tx_timeout_seconds() -> u64 {
	DEFAULT_TX_TIMEOUT_SECONDS
}

fn default_poll_interval_ms() -> u64 {
	DEFAULT_POLL_INTERVAL_MS
}

fn default_poll_attempts() -> u32 {
	DEFAULT_POLL_ATTEMPTS
}

fn default_request_timeout_seconds() -> u64 {
	DEFAULT_REQUEST_TIMEOUT_SECONDS
}

impl EndpointConfig {
	/// Creates a configuration with default fee and timing parameters.
	pub fn new(rpc_url: impl Into<String>, network_passphrase: impl Into<String>) -> Self {
		Self {
			rpc_url: rpc_url.into(),
			network_passphrase: network_passphrase.into(),
			base_fee: DEFAULT_BASE_FEE,
			tx_timeout_seconds: DEFAULT_TX_TIMEOUT_SECONDS,
			poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
			poll_attempts: DEFAULT_POLL_ATTEMPTS,
			request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
		}
	}

	pub fn testnet(rpc_url: impl Into<String>) -> Self {
		Self::new(rpc_url, TESTNET_PASSPHRASE)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_seconds)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = EndpointConfig::testnet("https://soroban-testnet.stellar.org");
		assert_eq!(config.base_fee, 100);
		assert_eq!(config.tx_timeout_seconds, 30);
		assert_eq!(config.poll_attempts, 60);
		assert_eq!(config.poll_interval(), Duration::from_secs(1));
		assert_eq!(config.network_passphrase, TESTNET_PASSPHRASE);
	}

	#[test]
	fn test_deserialize_fills_defaults() {
		let config: EndpointConfig = serde_json::from_str(
			r#"{"rpc_url":"http://localhost:8000","network_passphrase":"Standalone Network ; February 2017","poll_attempts":5}"#,
		)
		.unwrap();
		assert_eq!(config.poll_attempts, 5);
		assert_eq!(config.poll_interval_ms, 1_000);
		assert_eq!(config.request_timeout(), Duration::from_secs(30));
	}
}
