use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// One entry of an account's transaction history, most recent first.
#[derive(Debug, Clone)]
pub struct TransactionSummary {
    pub signature: Signature,
    pub block_time: Option<DateTime<Utc>>,
    /// The transaction errored on chain. Failed transfers never qualify.
    pub failed: bool,
}

/// Balance movement of a single account within one transaction, in lamports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: Pubkey,
    pub pre_balance: u64,
    pub post_balance: u64,
}

impl Participant {
    /// Net lamport change for this account, negative when it paid out.
    pub fn delta(&self) -> i128 {
        self.post_balance as i128 - self.pre_balance as i128
    }
}

/// A resolved transaction, carrying enough to decide whether it is a
/// qualifying transfer.
#[derive(Debug, Clone)]
pub struct TransactionDetail {
    pub succeeded: bool,
    pub block_time: Option<DateTime<Utc>>,
    pub participants: Vec<Participant>,
}

/// Convert a lamport delta to SOL.
pub fn lamports_to_sol(lamports: i128) -> Decimal {
    Decimal::from_i128_with_scale(lamports, 0) / Decimal::from(LAMPORTS_PER_SOL)
}
