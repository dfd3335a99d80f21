use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Invalid policy values. Fatal: the run aborts before any network activity.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositiveAmount { field: &'static str, value: Decimal },

    #[error("lookback window must be positive, got {hours} hours")]
    NonPositiveWindow { hours: i64 },

    #[error("max operations must be at least 1")]
    ZeroOperationCap,
}

/// Roster loading failures. Fatal: a run without wallets cannot start.
#[derive(Error, Debug)]
pub enum RosterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("no valid wallets in {path}")]
    NoValidWallets { path: String },
}

/// Per-wallet and per-transfer ledger failures. These are contained within
/// their loop iteration and surface only as warnings and aggregate counts.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("lookup failed for {address}: {message}")]
    Lookup { address: Pubkey, message: String },

    #[error("failed to fetch transaction {signature}: {message}")]
    TransactionFetch { signature: String, message: String },

    #[error("transfer submission failed: {message}")]
    Submission { message: String },

    #[error("transfer {signature} was not confirmed in time")]
    ConfirmationTimeout { signature: String },

    #[error("amount {0} SOL does not convert to a whole number of lamports")]
    InvalidAmount(Decimal),
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
