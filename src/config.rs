use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ConfigError;

/// Fixed buffer on top of the funding amount so a donor can always cover
/// the transfer fee. Conservative: a system transfer costs far less.
pub const FEE_RESERVE: Decimal = dec!(0.001);

/// Immutable per-run funding policy. All amounts are in SOL.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Minimum received amount for a historical transfer to count as funding.
    pub min_transfer_amount: Decimal,
    /// How far back from now a qualifying transfer may have occurred.
    pub lookback_window: Duration,
    /// Amount sent to each unfunded recipient.
    pub funding_amount: Decimal,
    /// Cap on disbursements attempted in a single run.
    pub max_operations: usize,
    /// Dry run: decide and report, but never submit a transfer.
    pub simulate_only: bool,
}

impl Policy {
    /// Reject unusable policies before any network activity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_transfer_amount <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveAmount {
                field: "minimum transfer amount",
                value: self.min_transfer_amount,
            });
        }
        if self.funding_amount <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveAmount {
                field: "funding amount",
                value: self.funding_amount,
            });
        }
        if self.lookback_window <= Duration::zero() {
            return Err(ConfigError::NonPositiveWindow {
                hours: self.lookback_window.num_hours(),
            });
        }
        if self.max_operations == 0 {
            return Err(ConfigError::ZeroOperationCap);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_policy() -> Policy {
        Policy {
            min_transfer_amount: dec!(0.1),
            lookback_window: Duration::hours(24),
            funding_amount: dec!(0.05),
            max_operations: 10,
            simulate_only: true,
        }
    }

    #[test]
    fn accepts_valid_policy() {
        assert!(valid_policy().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let mut policy = valid_policy();
        policy.min_transfer_amount = Decimal::ZERO;
        assert!(policy.validate().is_err());

        let mut policy = valid_policy();
        policy.funding_amount = dec!(-0.5);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_window() {
        let mut policy = valid_policy();
        policy.lookback_window = Duration::zero();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn rejects_zero_operation_cap() {
        let mut policy = valid_policy();
        policy.max_operations = 0;
        assert!(policy.validate().is_err());
    }
}
