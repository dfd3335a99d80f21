//! Funding distributor: assigns eligible donors round-robin to unfunded
//! recipients and executes (or simulates) one transfer each, under the
//! per-run operation cap.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use tracing::{debug, info, warn};

use crate::config::{Policy, FEE_RESERVE};
use crate::ledger::client::LedgerClient;
use crate::roster::models::{Donor, Recipient};

/// Rate limiting between submitted transfers. [`Pacing::none`] keeps tests
/// instant.
#[derive(Debug, Clone)]
pub struct Pacing {
    /// Pause after this many non-simulated attempts.
    pub batch_size: usize,
    pub pause: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            batch_size: usize::MAX,
            pause: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            batch_size: 5,
            pause: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisbursementStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Outcome of one attempted recipient. Simulated successes carry the donor
/// but no signature.
#[derive(Debug, Clone)]
pub struct Disbursement {
    pub recipient: Pubkey,
    pub donor: Option<Pubkey>,
    pub signature: Option<Signature>,
    pub status: DisbursementStatus,
}

/// Aggregate tally of one distribution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionOutcome {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct DistributionResult {
    pub outcome: DistributionOutcome,
    pub disbursements: Vec<Disbursement>,
}

/// A donor that holds a signing key and enough balance for at least one
/// disbursement.
struct AvailableDonor {
    address: Pubkey,
    signer: Arc<Keypair>,
    balance: Decimal,
}

pub struct FundingDistributor {
    ledger: Arc<dyn LedgerClient>,
    pacing: Pacing,
}

impl FundingDistributor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Disburse `policy.funding_amount` to the unfunded recipients, at most
    /// `policy.max_operations` of them, round-robin over the available
    /// donors. One recipient's failure never aborts the batch.
    ///
    /// Disbursements run strictly sequentially: a donor's balance is
    /// checked once and re-used across assignments, so concurrent sends
    /// from the same donor could over-commit it.
    pub async fn distribute(
        &self,
        unfunded: &[Recipient],
        donors: &[Donor],
        policy: &Policy,
    ) -> DistributionResult {
        let mut outcome = DistributionOutcome::default();
        let mut disbursements = Vec::new();

        if unfunded.is_empty() {
            info!("No unfunded recipients, nothing to distribute");
            return DistributionResult {
                outcome,
                disbursements,
            };
        }

        let attempt_count = unfunded.len().min(policy.max_operations);
        if attempt_count < unfunded.len() {
            let excess = unfunded.len() - attempt_count;
            warn!(
                "Operation cap {} reached, skipping {} of {} unfunded recipients",
                policy.max_operations,
                excess,
                unfunded.len()
            );
            outcome.skipped += excess;
        }
        let attempts = &unfunded[..attempt_count];

        let available = self.resolve_available_donors(donors, policy).await;
        if available.is_empty() {
            warn!(
                "No donor can cover {} SOL plus the {} SOL fee reserve, skipping all {} recipients",
                policy.funding_amount,
                FEE_RESERVE,
                attempts.len()
            );
            outcome.skipped += attempts.len();
            return DistributionResult {
                outcome,
                disbursements,
            };
        }
        info!(
            "{} available donors for {} recipients{}",
            available.len(),
            attempts.len(),
            if policy.simulate_only { " (dry run)" } else { "" }
        );

        let mut since_pause = 0usize;
        for (i, recipient) in attempts.iter().enumerate() {
            let donor = &available[i % available.len()];
            debug!(
                "Assigning donor {} ({} SOL available) to {}",
                donor.address, donor.balance, recipient.address
            );

            // Donor and recipient rosters may overlap; a wallet never
            // funds itself.
            if donor.address == recipient.address {
                warn!("Donor {} assigned to itself, skipping", donor.address);
                outcome.skipped += 1;
                disbursements.push(Disbursement {
                    recipient: recipient.address,
                    donor: Some(donor.address),
                    signature: None,
                    status: DisbursementStatus::Skipped,
                });
                continue;
            }

            if policy.simulate_only {
                info!(
                    "[dry run] Would send {} SOL from {} to {}",
                    policy.funding_amount, donor.address, recipient.address
                );
                outcome.success += 1;
                disbursements.push(Disbursement {
                    recipient: recipient.address,
                    donor: Some(donor.address),
                    signature: None,
                    status: DisbursementStatus::Succeeded,
                });
                continue;
            }

            match self
                .ledger
                .submit_transfer(&donor.signer, &recipient.address, policy.funding_amount)
                .await
            {
                Ok(signature) => {
                    info!(
                        "Funded {} with {} SOL from {} ({})",
                        recipient.address, policy.funding_amount, donor.address, signature
                    );
                    outcome.success += 1;
                    disbursements.push(Disbursement {
                        recipient: recipient.address,
                        donor: Some(donor.address),
                        signature: Some(signature),
                        status: DisbursementStatus::Succeeded,
                    });
                }
                Err(e) => {
                    warn!("Transfer to {} failed: {}", recipient.address, e);
                    outcome.failed += 1;
                    disbursements.push(Disbursement {
                        recipient: recipient.address,
                        donor: Some(donor.address),
                        signature: None,
                        status: DisbursementStatus::Failed,
                    });
                }
            }

            since_pause += 1;
            // No pause after the last attempt; there is nothing to pace.
            if since_pause >= self.pacing.batch_size && i + 1 < attempts.len() {
                since_pause = 0;
                tokio::time::sleep(self.pacing.pause).await;
            }
        }

        DistributionResult {
            outcome,
            disbursements,
        }
    }

    /// Donors holding a signing key and at least `funding_amount` plus the
    /// fee reserve. A balance lookup failure excludes the donor for this
    /// run; it is never retried.
    async fn resolve_available_donors(
        &self,
        donors: &[Donor],
        policy: &Policy,
    ) -> Vec<AvailableDonor> {
        let required = policy.funding_amount + FEE_RESERVE;
        let mut available = Vec::new();
        for donor in donors {
            let Some(signer) = &donor.signer else {
                debug!("Donor {} is watch-only, not a funding source", donor.address);
                continue;
            };
            match self.ledger.get_balance(&donor.address).await {
                Ok(balance) if balance >= required => {
                    available.push(AvailableDonor {
                        address: donor.address,
                        signer: signer.clone(),
                        balance,
                    });
                }
                Ok(balance) => {
                    warn!(
                        "Donor {} balance {} is below the required {}, excluded",
                        donor.address, balance, required
                    );
                }
                Err(e) => {
                    warn!("Balance lookup failed for donor {}, excluded: {}", donor.address, e);
                }
            }
        }
        available
    }
}
