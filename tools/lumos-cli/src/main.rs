//! # lumos
//!
//! Entry point for the `lumos` binary. Parses CLI arguments, loads the
//! configuration, initializes logging and runs one command:
//!
//! - `balance`  - read a wallet's SPL token balance
//! - `transfer` - sign a SOL transfer and hand it to the fee-paying relay
//!
//! Results go to stdout; logs go to stderr.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use chain_sol::Address;
use relay_core::{
    init_logging, BalanceReader, LocalKeypair, LogFormat, RelayClient, RelayConfig,
    RpcLedgerClient, TransferPipeline, TransferSigner,
};

use cli::{BalanceArgs, Commands, LumosCli, TransferArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LumosCli::parse();

    let format: LogFormat = cli.log_format.parse()?;
    init_logging(&cli.log_level, format)?;

    let config = load_config(cli.config.as_deref(), cli.rpc_url.as_deref())?;

    match cli.command {
        Commands::Balance(args) => show_balance(&config, args).await,
        Commands::Transfer(args) => send_transfer(config, args).await,
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(path: Option<&Path>, rpc_url: Option<&str>) -> Result<RelayConfig> {
    let mut config = match path {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RelayConfig::default(),
    };
    if let Some(url) = rpc_url {
        config.rpc_url = url.to_string();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn show_balance(config: &RelayConfig, args: BalanceArgs) -> Result<()> {
    let wallet: Address = args.wallet.parse().context("invalid --wallet")?;
    let mint: Address = args.mint.parse().context("invalid --mint")?;
    let decimals = args.decimals.unwrap_or(config.token_decimals);

    let ledger = RpcLedgerClient::from_config(config)?;
    tracing::info!(rpc_url = ledger.url(), %wallet, %mint, "querying balance");

    let balance = BalanceReader::new(&ledger)
        .with_decimals(decimals)
        .balance(&wallet, &mint)
        .await
        .with_context(|| format!("failed to read balance of {mint} for {wallet}"))?;

    println!("{balance}");
    Ok(())
}

async fn send_transfer(mut config: RelayConfig, args: TransferArgs) -> Result<()> {
    if let Some(url) = args.relay_url {
        config.relay_url = Some(url);
    }
    if let Some(fee_payer) = args.fee_payer {
        config.fee_payer = Some(fee_payer);
    }
    config.validate().context("invalid configuration")?;

    let recipient: Address = args.recipient.parse().context("invalid --recipient")?;
    let signer = LocalKeypair::from_keypair_file(&args.keypair)
        .with_context(|| format!("failed to load keypair {}", args.keypair.display()))?;

    let ledger = RpcLedgerClient::from_config(&config)?;
    let relay = RelayClient::from_config(&config)?;
    tracing::info!(
        sender = %signer.address(),
        %recipient,
        amount = %args.amount,
        relay = relay.url(),
        "sending transfer"
    );

    let receipt = TransferPipeline::new(&ledger, &signer, &relay)
        .with_fee_payer(config.fee_payer_address()?)
        .with_commitment(config.digest_commitment)
        .submit_transfer(&recipient, args.amount)
        .await
        .context("transfer failed")?;

    println!("request id:  {}", receipt.request_id);
    println!("digest:      {}", receipt.digest);
    match receipt.ack.transaction_id() {
        Some(id) => println!("transaction: {id}"),
        None => println!("relay response: {}", receipt.ack.body),
    }
    Ok(())
}
