use std::path::PathBuf;

use chrono::Duration;
use clap::Parser;
use rust_decimal::Decimal;

use crate::config::Policy;

/// Check which recipient wallets never received a qualifying transfer from
/// the donor set, then top up the ones that were missed.
#[derive(Debug, Parser)]
#[command(name = "funder", version, about)]
pub struct Cli {
    /// CSV or JSON file listing donor wallets (address and optional secret key).
    #[arg(long, env = "FUNDER_DONORS")]
    pub donors: PathBuf,

    /// CSV or JSON file listing recipient wallets.
    #[arg(long, env = "FUNDER_RECIPIENTS")]
    pub recipients: PathBuf,

    /// Solana RPC endpoint.
    #[arg(
        long,
        env = "SOLANA_RPC_URL",
        default_value = "https://api.mainnet-beta.solana.com"
    )]
    pub rpc_url: String,

    /// Minimum received amount (SOL) for a past transfer to count as funding.
    #[arg(long, default_value = "0.1")]
    pub min_amount: Decimal,

    /// How far back to look for qualifying transfers, in hours.
    #[arg(long, default_value_t = 24)]
    pub window_hours: i64,

    /// Amount (SOL) sent to each unfunded recipient.
    #[arg(long, default_value = "0.05")]
    pub funding_amount: Decimal,

    /// Maximum number of disbursements attempted in this run.
    #[arg(long, default_value_t = 50)]
    pub max_operations: usize,

    /// Submit real transfers. Without this flag the run is a dry run.
    #[arg(long)]
    pub execute: bool,
}

impl Cli {
    pub fn policy(&self) -> Policy {
        Policy {
            min_transfer_amount: self.min_amount,
            lookback_window: Duration::hours(self.window_hours),
            funding_amount: self.funding_amount,
            max_operations: self.max_operations,
            simulate_only: !self.execute,
        }
    }
}
