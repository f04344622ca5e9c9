//! Command-line interface for `lumos`, defined with `clap` derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Lumos relay client.
///
/// Reads SPL token balances and sends fee-relayed SOL transfers.
#[derive(Parser, Debug)]
#[command(name = "lumos", about = "Lumos relay client", version, propagate_version = true)]
pub struct LumosCli {
    /// Path to a TOML configuration file.
    #[arg(long, short = 'c', global = true, env = "LUMOS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Solana JSON-RPC endpoint. Overrides the config file.
    #[arg(long, global = true, env = "LUMOS_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "LUMOS_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log level when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "lumos=info,relay_core=info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a wallet's balance of one token.
    Balance(BalanceArgs),
    /// Sign a SOL transfer and submit it to the relay.
    Transfer(TransferArgs),
}

#[derive(Parser, Debug)]
pub struct BalanceArgs {
    /// Wallet address (Base58).
    #[arg(long)]
    pub wallet: String,

    /// Token mint address (Base58).
    #[arg(long)]
    pub mint: String,

    /// Token decimals. Overrides the config file.
    #[arg(long)]
    pub decimals: Option<u8>,
}

#[derive(Parser, Debug)]
pub struct TransferArgs {
    /// Sender keypair file (Solana CLI JSON format).
    #[arg(long, short = 'k', env = "LUMOS_KEYPAIR")]
    pub keypair: PathBuf,

    /// Recipient address (Base58).
    #[arg(long)]
    pub recipient: String,

    /// Amount in lamports.
    #[arg(long, allow_negative_numbers = true)]
    pub amount: i128,

    /// Relay base URL. Overrides the config file.
    #[arg(long, env = "LUMOS_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Relay fee payer address. Overrides the config file.
    #[arg(long)]
    pub fee_payer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        LumosCli::command().debug_assert();
    }

    #[test]
    fn parses_transfer() {
        let cli = LumosCli::parse_from([
            "lumos",
            "transfer",
            "--keypair",
            "id.json",
            "--recipient",
            "GtqFfeXnfmoxbexjoVcr758taRmjrWHg8jnVWeLjdYnU",
            "--amount",
            "1000000",
            "--relay-url",
            "https://relay.example.com",
        ]);
        match cli.command {
            Commands::Transfer(args) => {
                assert_eq!(args.amount, 1_000_000);
                assert_eq!(args.relay_url.as_deref(), Some("https://relay.example.com"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_amount_reaches_validation() {
        let cli = LumosCli::parse_from([
            "lumos",
            "transfer",
            "--keypair",
            "id.json",
            "--recipient",
            "x",
            "--amount",
            "-5",
        ]);
        assert!(matches!(cli.command, Commands::Transfer(ref a) if a.amount == -5));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = LumosCli::parse_from([
            "lumos",
            "balance",
            "--wallet",
            "w",
            "--mint",
            "m",
            "--rpc-url",
            "http://127.0.0.1:8899",
        ]);
        assert_eq!(cli.rpc_url.as_deref(), Some("http://127.0.0.1:8899"));
    }
}
