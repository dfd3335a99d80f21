//! In-memory ledger used by the verifier, distributor and runner tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

use crate::error::{AppResult, LedgerError};
use crate::ledger::client::LedgerClient;
use crate::ledger::models::{TransactionDetail, TransactionSummary};

#[derive(Default)]
pub struct MockLedger {
    balances: HashMap<Pubkey, Decimal>,
    histories: HashMap<Pubkey, Vec<TransactionSummary>>,
    details: HashMap<Signature, TransactionDetail>,
    failing_lookups: HashSet<Pubkey>,
    failing_submissions: HashSet<Pubkey>,
    pub balance_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    /// (from, to, amount) of every submit_transfer call, in order.
    pub submitted: Mutex<Vec<(Pubkey, Pubkey, Decimal)>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, address: Pubkey, balance: Decimal) -> Self {
        self.balances.insert(address, balance);
        self
    }

    pub fn with_history(mut self, address: Pubkey, history: Vec<TransactionSummary>) -> Self {
        self.histories.insert(address, history);
        self
    }

    pub fn with_detail(mut self, signature: Signature, detail: TransactionDetail) -> Self {
        self.details.insert(signature, detail);
        self
    }

    /// Balance and history lookups for this address fail.
    pub fn with_failing_lookup(mut self, address: Pubkey) -> Self {
        self.failing_lookups.insert(address);
        self
    }

    /// Transfers to this address fail at submission.
    pub fn with_failing_submission(mut self, to: Pubkey) -> Self {
        self.failing_submissions.insert(to);
        self
    }

    pub fn submissions(&self) -> Vec<(Pubkey, Pubkey, Decimal)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_balance(&self, address: &Pubkey) -> AppResult<Decimal> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_lookups.contains(address) {
            return Err(LedgerError::Lookup {
                address: *address,
                message: "lookup unavailable".to_string(),
            }
            .into());
        }
        Ok(self.balances.get(address).copied().unwrap_or(Decimal::ZERO))
    }

    async fn get_recent_transactions(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> AppResult<Vec<TransactionSummary>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_lookups.contains(address) {
            return Err(LedgerError::Lookup {
                address: *address,
                message: "lookup unavailable".to_string(),
            }
            .into());
        }
        let mut history = self.histories.get(address).cloned().unwrap_or_default();
        history.truncate(limit);
        Ok(history)
    }

    async fn get_transaction_detail(
        &self,
        signature: &Signature,
    ) -> AppResult<Option<TransactionDetail>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.details.get(signature).cloned())
    }

    async fn submit_transfer(
        &self,
        from: &Keypair,
        to: &Pubkey,
        amount_sol: Decimal,
    ) -> AppResult<Signature> {
        self.submitted
            .lock()
            .unwrap()
            .push((from.pubkey(), *to, amount_sol));
        if self.failing_submissions.contains(to) {
            return Err(LedgerError::Submission {
                message: format!("transfer to {to} rejected"),
            }
            .into());
        }
        Ok(Signature::default())
    }
}
