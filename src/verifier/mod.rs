//! Funding verifier: classifies each recipient as funded or unfunded by
//! scanning its recent transaction history for a qualifying transfer from
//! the donor set.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::config::Policy;
use crate::ledger::client::LedgerClient;
use crate::ledger::models::{lamports_to_sol, TransactionDetail};
use crate::roster::models::{Donor, Recipient};

/// How many of an account's most recent transactions are inspected.
///
/// A qualifying transfer older than this window but still inside the time
/// cutoff is missed. Accepted approximation: bounded history keeps the
/// per-recipient cost flat on high-activity accounts, and the fail-safe
/// bias makes a miss a double-fund rather than a dropped wallet.
pub const HISTORY_FETCH_LIMIT: usize = 20;

/// Recipients classified concurrently. Output order is input order
/// regardless; each recipient's own history scan stays sequential.
const CLASSIFY_CONCURRENCY: usize = 4;

pub struct FundingVerifier {
    ledger: Arc<dyn LedgerClient>,
}

impl FundingVerifier {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Classify every recipient and return the unfunded subset, preserving
    /// the order the recipients were given in.
    pub async fn classify(
        &self,
        donors: &[Donor],
        recipients: &[Recipient],
        policy: &Policy,
    ) -> Vec<Recipient> {
        let donor_set: HashSet<Pubkey> = donors.iter().map(|d| d.address).collect();
        let cutoff = Utc::now() - policy.lookback_window;

        // Rosters may repeat an address; a recipient is classified (and
        // later disbursed to) at most once. First occurrence wins so the
        // output order stays the input order.
        let mut seen = HashSet::with_capacity(recipients.len());
        let recipients: Vec<&Recipient> = recipients
            .iter()
            .filter(|recipient| {
                if seen.insert(recipient.address) {
                    true
                } else {
                    warn!(
                        "Duplicate recipient {} in roster, keeping the first occurrence",
                        recipient.address
                    );
                    false
                }
            })
            .collect();
        info!(
            "Classifying {} recipients against {} donors, cutoff {}",
            recipients.len(),
            donor_set.len(),
            cutoff.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let funded: Vec<bool> = stream::iter(recipients.iter().copied())
            .map(|recipient| self.is_funded(recipient, &donor_set, cutoff, policy))
            .buffered(CLASSIFY_CONCURRENCY)
            .collect()
            .await;

        recipients
            .into_iter()
            .zip(funded)
            .filter(|(_, funded)| !funded)
            .map(|(recipient, _)| recipient.clone())
            .collect()
    }

    /// Whether any recent transaction funds this recipient, stopping at the
    /// first qualifying one.
    ///
    /// A history lookup failure classifies the recipient as unfunded rather
    /// than aborting the batch: double-funding a wallet whose query timed
    /// out is acceptable, silently dropping one is not.
    async fn is_funded(
        &self,
        recipient: &Recipient,
        donor_set: &HashSet<Pubkey>,
        cutoff: DateTime<Utc>,
        policy: &Policy,
    ) -> bool {
        let summaries = match self
            .ledger
            .get_recent_transactions(&recipient.address, HISTORY_FETCH_LIMIT)
            .await
        {
            Ok(summaries) => summaries,
            Err(e) => {
                warn!(
                    "History lookup failed for {}, treating as unfunded: {}",
                    recipient.address, e
                );
                return false;
            }
        };

        for summary in summaries {
            if summary.failed {
                continue;
            }
            match summary.block_time {
                // History is newest first; everything from here on is older.
                Some(t) if t < cutoff => break,
                Some(_) => {}
                None => continue,
            }

            // Details are fetched one signature at a time so the qualifying
            // short-circuit bounds the network calls.
            let detail = match self.ledger.get_transaction_detail(&summary.signature).await {
                Ok(Some(detail)) => detail,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        "Skipping transaction {} for {}: {}",
                        summary.signature, recipient.address, e
                    );
                    continue;
                }
            };

            if is_qualifying(
                &detail,
                &recipient.address,
                donor_set,
                policy.min_transfer_amount,
            ) {
                debug!(
                    "{} funded by transaction {}",
                    recipient.address, summary.signature
                );
                return true;
            }
        }
        false
    }
}

/// A transfer qualifies when the transaction succeeded, the recipient's
/// balance grew by at least the minimum amount, and some donor's balance
/// shrank in the same transaction.
fn is_qualifying(
    detail: &TransactionDetail,
    recipient: &Pubkey,
    donor_set: &HashSet<Pubkey>,
    min_amount: Decimal,
) -> bool {
    if !detail.succeeded {
        return false;
    }
    let Some(received) = detail.participants.iter().find(|p| p.address == *recipient) else {
        return false;
    };
    let delta = received.delta();
    if delta <= 0 || lamports_to_sol(delta) < min_amount {
        return false;
    }
    detail
        .participants
        .iter()
        .any(|p| donor_set.contains(&p.address) && p.delta() < 0)
}
