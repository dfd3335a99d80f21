//! Run coordinator: sequences verification and distribution over loaded
//! rosters and reports the final tally.

use std::sync::Arc;

use tracing::info;

use crate::config::Policy;
use crate::distributor::{DistributionOutcome, FundingDistributor, Pacing};
use crate::ledger::client::LedgerClient;
use crate::roster::models::{Donor, Recipient};
use crate::verifier::FundingVerifier;

/// Final tally of one reconciliation run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub recipients: usize,
    pub funded: usize,
    pub unfunded: usize,
    pub outcome: DistributionOutcome,
}

pub struct RunCoordinator {
    verifier: FundingVerifier,
    distributor: FundingDistributor,
}

impl RunCoordinator {
    pub fn new(ledger: Arc<dyn LedgerClient>, pacing: Pacing) -> Self {
        Self {
            verifier: FundingVerifier::new(ledger.clone()),
            distributor: FundingDistributor::new(ledger).with_pacing(pacing),
        }
    }

    pub async fn run(
        &self,
        donors: &[Donor],
        recipients: &[Recipient],
        policy: &Policy,
    ) -> RunReport {
        info!(
            "Starting funding run: {} donors, {} recipients{}",
            donors.len(),
            recipients.len(),
            if policy.simulate_only { " (dry run)" } else { "" }
        );

        let unfunded = self.verifier.classify(donors, recipients, policy).await;
        info!(
            "{} of {} recipients already funded, {} unfunded",
            recipients.len() - unfunded.len(),
            recipients.len(),
            unfunded.len()
        );

        let result = self.distributor.distribute(&unfunded, donors, policy).await;

        let report = RunReport {
            recipients: recipients.len(),
            funded: recipients.len() - unfunded.len(),
            unfunded: unfunded.len(),
            outcome: result.outcome,
        };
        info!(
            "Run complete: {} funded, {} unfunded | disbursements: {} succeeded, {} failed, {} skipped",
            report.funded,
            report.unfunded,
            report.outcome.success,
            report.outcome.failed,
            report.outcome.skipped
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::models::{Participant, TransactionDetail, TransactionSummary};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::{Keypair, Signature};

    // One funded recipient, one bare wallet, a single donor with balance:
    // only the bare wallet gets a (simulated) disbursement.
    #[tokio::test]
    async fn end_to_end_dry_run() {
        let donor = Donor::with_signer(Keypair::new());
        let funded = Pubkey::new_unique();
        let bare = Pubkey::new_unique();

        let signature = Signature::from([7u8; 64]);
        let ledger = MockLedger::new()
            .with_balance(donor.address, dec!(1))
            .with_history(
                funded,
                vec![TransactionSummary {
                    signature,
                    block_time: Some(Utc::now() - Duration::minutes(10)),
                    failed: false,
                }],
            )
            .with_detail(
                signature,
                TransactionDetail {
                    succeeded: true,
                    block_time: None,
                    participants: vec![
                        Participant {
                            address: donor.address,
                            pre_balance: 1_000_000_000,
                            post_balance: 799_995_000,
                        },
                        Participant {
                            address: funded,
                            pre_balance: 0,
                            post_balance: 200_000_000,
                        },
                    ],
                },
            );
        let ledger = Arc::new(ledger);

        let policy = Policy {
            min_transfer_amount: dec!(0.1),
            lookback_window: Duration::hours(24),
            funding_amount: dec!(0.05),
            max_operations: 10,
            simulate_only: true,
        };

        let donors = vec![donor];
        let recipients = vec![Recipient::new(funded), Recipient::new(bare)];
        let coordinator = RunCoordinator::new(ledger.clone(), Pacing::none());
        let report = coordinator.run(&donors, &recipients, &policy).await;

        assert_eq!(report.recipients, 2);
        assert_eq!(report.funded, 1);
        assert_eq!(report.unfunded, 1);
        assert_eq!(report.outcome.success, 1);
        assert_eq!(report.outcome.failed, 0);
        assert_eq!(report.outcome.skipped, 0);
        // Dry run: nothing was ever submitted.
        assert!(ledger.submissions().is_empty());
    }
}
