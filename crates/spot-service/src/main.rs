//! Command-line entry point for the SPOT contract service.
//!
//! Each invocation loads the configuration, wires the Soroban RPC client,
//! the signers and the contract client together, runs one subcommand and
//! prints its result as JSON on stdout. Logs go to stderr.
//!
//! Ctrl-C cancels the running call instead of dropping it, so a write that
//! was already submitted still leaves its audit record and hash.

use clap::Parser;
use spot_account::AccountService;
use spot_config::{AccountsConfig, Config};
use spot_core::{ContractInvocationService, SpotContract};
use spot_delivery::implementations::soroban::jsonrpc::JsonRpcClient;
use spot_types::truncate_id;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod commands;

use commands::{Command, Signers};

/// Command-line arguments for the SPOT service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(
		rpc_url = %config.network.rpc_url,
		contract = %truncate_id(&config.contract.spot_contract_id),
		"Loaded configuration"
	);

	let cancel = CancellationToken::new();
	let spot = build_contract(&config)?.with_cancellation(cancel.clone());
	let signers = build_signers(&config.accounts)?;

	let run = commands::run(args.command, &spot, &signers);
	tokio::pin!(run);
	let output = tokio::select! {
		result = &mut run => result?,
		_ = tokio::signal::ctrl_c() => {
			tracing::warn!("Interrupted; a submitted transaction may still be applied");
			cancel.cancel();
			run.await?
		}
	};

	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

/// Builds the contract client on top of the JSON-RPC endpoint.
fn build_contract(config: &Config) -> Result<SpotContract, Box<dyn std::error::Error>> {
	let rpc = JsonRpcClient::new(&config.network)?;
	let service = ContractInvocationService::new(Arc::new(rpc), config.network.clone());
	Ok(SpotContract::new(
		Arc::new(service),
		config.contract.spot_contract_id.clone(),
	))
}

/// Creates the admin and claim payer signers with the configured
/// implementation.
fn build_signers(accounts: &AccountsConfig) -> Result<Signers, Box<dyn std::error::Error>> {
	let admin = spot_account::create_account(&accounts.implementation, &accounts.admin_secret)?;
	let claim_payer =
		spot_account::create_account(&accounts.implementation, accounts.claim_payer())?;
	Ok(Signers {
		admin: AccountService::new(admin),
		claim_payer: AccountService::new(claim_payer),
	})
}
