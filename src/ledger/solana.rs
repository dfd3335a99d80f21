use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{EncodedTransaction, UiMessage, UiTransactionEncoding};
use tracing::debug;

use crate::error::{AppResult, LedgerError};
use crate::ledger::client::LedgerClient;
use crate::ledger::models::{Participant, TransactionDetail, TransactionSummary};

#[derive(Debug, Clone)]
pub struct SolanaClientConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub confirmation_timeout: Duration,
}

impl Default for SolanaClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: CommitmentConfig::confirmed(),
            confirmation_timeout: Duration::from_secs(60),
        }
    }
}

/// [`LedgerClient`] over Solana JSON-RPC.
pub struct SolanaLedgerClient {
    config: SolanaClientConfig,
    rpc: RpcClient,
}

impl SolanaLedgerClient {
    pub fn new(config: SolanaClientConfig) -> Self {
        let rpc = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment);
        Self { config, rpc }
    }
}

#[async_trait]
impl LedgerClient for SolanaLedgerClient {
    async fn get_balance(&self, address: &Pubkey) -> AppResult<Decimal> {
        let lamports = self
            .rpc
            .get_balance(address)
            .await
            .map_err(|e| LedgerError::Lookup {
                address: *address,
                message: e.to_string(),
            })?;
        Ok(Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL))
    }

    async fn get_recent_transactions(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> AppResult<Vec<TransactionSummary>> {
        let statuses = self
            .rpc
            .get_signatures_for_address_with_config(
                address,
                GetConfirmedSignaturesForAddress2Config {
                    before: None,
                    until: None,
                    limit: Some(limit),
                    commitment: Some(self.config.commitment),
                },
            )
            .await
            .map_err(|e| LedgerError::Lookup {
                address: *address,
                message: e.to_string(),
            })?;

        let mut summaries = Vec::with_capacity(statuses.len());
        for status in statuses {
            let signature =
                Signature::from_str(&status.signature).map_err(|e| LedgerError::Lookup {
                    address: *address,
                    message: format!("unparseable signature {}: {e}", status.signature),
                })?;
            summaries.push(TransactionSummary {
                signature,
                block_time: status
                    .block_time
                    .and_then(|t| Utc.timestamp_opt(t, 0).single()),
                failed: status.err.is_some(),
            });
        }
        Ok(summaries)
    }

    async fn get_transaction_detail(
        &self,
        signature: &Signature,
    ) -> AppResult<Option<TransactionDetail>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Json),
            commitment: Some(self.config.commitment),
            max_supported_transaction_version: Some(0),
        };
        let confirmed = match self.rpc.get_transaction_with_config(signature, config).await {
            Ok(confirmed) => confirmed,
            Err(e) if e.to_string().contains("not found") => return Ok(None),
            Err(e) => {
                return Err(LedgerError::TransactionFetch {
                    signature: signature.to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };

        let block_time = confirmed
            .block_time
            .and_then(|t| Utc.timestamp_opt(t, 0).single());
        let Some(meta) = confirmed.transaction.meta else {
            return Ok(None);
        };
        let succeeded = meta.err.is_none();

        // Static keys first, then address-table lookups: this matches the
        // indexing of pre_balances/post_balances.
        let mut account_keys: Vec<String> = match confirmed.transaction.transaction {
            EncodedTransaction::Json(ui) => match ui.message {
                UiMessage::Raw(raw) => raw.account_keys,
                UiMessage::Parsed(parsed) => {
                    parsed.account_keys.into_iter().map(|k| k.pubkey).collect()
                }
            },
            // Only the Json encoding is ever requested.
            _ => return Ok(None),
        };
        if let OptionSerializer::Some(loaded) = &meta.loaded_addresses {
            account_keys.extend(loaded.writable.iter().cloned());
            account_keys.extend(loaded.readonly.iter().cloned());
        }

        let mut participants = Vec::with_capacity(account_keys.len());
        for (i, key) in account_keys.iter().enumerate() {
            let (Some(&pre_balance), Some(&post_balance)) =
                (meta.pre_balances.get(i), meta.post_balances.get(i))
            else {
                break;
            };
            let Ok(address) = Pubkey::from_str(key) else {
                continue;
            };
            participants.push(Participant {
                address,
                pre_balance,
                post_balance,
            });
        }

        Ok(Some(TransactionDetail {
            succeeded,
            block_time,
            participants,
        }))
    }

    async fn submit_transfer(
        &self,
        from: &Keypair,
        to: &Pubkey,
        amount_sol: Decimal,
    ) -> AppResult<Signature> {
        let lamports = sol_to_lamports(amount_sol)?;

        let blockhash =
            self.rpc
                .get_latest_blockhash()
                .await
                .map_err(|e| LedgerError::Submission {
                    message: format!("failed to get blockhash: {e}"),
                })?;

        let instruction = system_instruction::transfer(&from.pubkey(), to, lamports);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&from.pubkey()),
            &[from],
            blockhash,
        );

        let signature =
            self.rpc
                .send_transaction(&transaction)
                .await
                .map_err(|e| LedgerError::Submission {
                    message: e.to_string(),
                })?;
        debug!("Transfer submitted: {}", signature);

        self.await_confirmation(signature).await?;
        Ok(signature)
    }
}

impl SolanaLedgerClient {
    /// Poll signature status until the configured commitment is reached.
    async fn await_confirmation(&self, signature: Signature) -> AppResult<()> {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        loop {
            if let Ok(response) = self.rpc.get_signature_statuses(&[signature]).await {
                if let Some(Some(status)) = response.value.first() {
                    if let Some(err) = &status.err {
                        return Err(LedgerError::Submission {
                            message: format!("transfer {signature} failed on chain: {err:?}"),
                        }
                        .into());
                    }
                    if status.confirmation_status.is_some() {
                        return Ok(());
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(LedgerError::ConfirmationTimeout {
                    signature: signature.to_string(),
                }
                .into());
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}

fn sol_to_lamports(amount: Decimal) -> Result<u64, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    let lamports = amount * Decimal::from(LAMPORTS_PER_SOL);
    // to_u64 would silently drop a sub-lamport fraction.
    if !lamports.fract().is_zero() {
        return Err(LedgerError::InvalidAmount(amount));
    }
    lamports.to_u64().ok_or(LedgerError::InvalidAmount(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sol_converts_to_lamports() {
        assert_eq!(sol_to_lamports(dec!(0.05)).unwrap(), 50_000_000);
        assert_eq!(sol_to_lamports(dec!(1)).unwrap(), 1_000_000_000);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(sol_to_lamports(Decimal::ZERO).is_err());
        assert!(sol_to_lamports(dec!(-1)).is_err());
    }

    #[test]
    fn sub_lamport_fractions_are_rejected_not_truncated() {
        // Half a lamport.
        assert!(sol_to_lamports(dec!(0.0000000005)).is_err());
        // One lamport over 0.1 SOL is still a whole number of lamports.
        assert_eq!(sol_to_lamports(dec!(0.100000001)).unwrap(), 100_000_001);
    }
}
