pub mod client;
pub mod models;
pub mod solana;

#[cfg(test)]
pub(crate) mod mock;

pub use client::LedgerClient;
pub use models::{Participant, TransactionDetail, TransactionSummary};
