use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

use crate::error::AppResult;
use crate::ledger::models::{TransactionDetail, TransactionSummary};

/// Read and submit boundary against the ledger network.
///
/// The funding core only ever talks to this trait, so tests run against an
/// in-memory ledger and the binary runs against Solana RPC.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current balance of an account, in SOL.
    async fn get_balance(&self, address: &Pubkey) -> AppResult<Decimal>;

    /// Up to `limit` most recent transactions touching an account,
    /// newest first.
    async fn get_recent_transactions(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> AppResult<Vec<TransactionSummary>>;

    /// Resolve one transaction. `Ok(None)` when the ledger no longer has it.
    async fn get_transaction_detail(
        &self,
        signature: &Signature,
    ) -> AppResult<Option<TransactionDetail>>;

    /// Submit a transfer of `amount_sol` and wait for confirmation.
    async fn submit_transfer(
        &self,
        from: &Keypair,
        to: &Pubkey,
        amount_sol: Decimal,
    ) -> AppResult<Signature>;
}
