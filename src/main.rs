mod cli;
mod config;
mod distributor;
mod error;
mod ledger;
mod roster;
mod runner;
mod verifier;

use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::distributor::Pacing;
use crate::ledger::solana::{SolanaClientConfig, SolanaLedgerClient};
use crate::runner::RunCoordinator;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,wallet_funder=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Configuration and roster problems abort before any network activity.
    let policy = cli.policy();
    policy.validate()?;

    let donors = roster::loader::load_donors(&cli.donors)?;
    let recipients = roster::loader::load_recipients(&cli.recipients)?;
    info!(
        "Loaded {} donors and {} recipients",
        donors.len(),
        recipients.len()
    );

    let ledger = Arc::new(SolanaLedgerClient::new(SolanaClientConfig {
        rpc_url: cli.rpc_url.clone(),
        ..SolanaClientConfig::default()
    }));

    let coordinator = RunCoordinator::new(ledger, Pacing::default());
    let report = coordinator.run(&donors, &recipients, &policy).await;

    // Failed disbursements are a normal run outcome; only startup problems
    // produce a non-zero exit.
    println!(
        "funded={} unfunded={} sent={} failed={} skipped={}",
        report.funded,
        report.unfunded,
        report.outcome.success,
        report.outcome.failed,
        report.outcome.skipped
    );
    Ok(())
}
