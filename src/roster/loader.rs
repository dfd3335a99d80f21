//! Wallet roster loading.
//!
//! Rosters arrive as CSV or JSON files of uneven shape: exported spreadsheets
//! with guessable header names, bare one-column address lists, or key backups
//! with no address column at all. Everything format-specific is normalized
//! into [`RawWallet`] rows here; the rest of the crate only ever sees
//! validated [`Donor`] and [`Recipient`] lists.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tracing::warn;

use crate::error::{AppResult, RosterError};
use crate::roster::models::{Donor, Recipient};

const ADDRESS_COLUMNS: &[&str] = &["address", "wallet", "pubkey", "account", "recipient", "to"];
const SECRET_COLUMNS: &[&str] = &[
    "key",
    "secret",
    "secret_key",
    "secretkey",
    "private_key",
    "privatekey",
    "keypair",
];

/// One roster row before validation.
#[derive(Debug, Default, Clone)]
struct RawWallet {
    address: Option<String>,
    secret: Option<String>,
    line: usize,
}

/// Load the donor roster. Rows with an unusable address and no usable key
/// are discarded with a warning; an empty surviving list is fatal.
pub fn load_donors(path: &Path) -> AppResult<Vec<Donor>> {
    let rows = read_rows(path)?;
    donors_from_rows(rows, path)
}

fn donors_from_rows(rows: Vec<RawWallet>, path: &Path) -> AppResult<Vec<Donor>> {
    let mut donors = Vec::new();
    for row in rows {
        match donor_from_row(&row) {
            Ok(donor) => donors.push(donor),
            Err(reason) => warn!(
                "Discarding donor row {} in {}: {}",
                row.line,
                path.display(),
                reason
            ),
        }
    }
    if donors.is_empty() {
        return Err(RosterError::NoValidWallets {
            path: path.display().to_string(),
        }
        .into());
    }
    Ok(donors)
}

/// Load the recipient roster. Secret-key columns are ignored on purpose:
/// recipients are addresses only.
pub fn load_recipients(path: &Path) -> AppResult<Vec<Recipient>> {
    let rows = read_rows(path)?;
    recipients_from_rows(rows, path)
}

fn recipients_from_rows(rows: Vec<RawWallet>, path: &Path) -> AppResult<Vec<Recipient>> {
    let mut recipients = Vec::new();
    for row in rows {
        match recipient_from_row(&row) {
            Ok(recipient) => recipients.push(recipient),
            Err(reason) => warn!(
                "Discarding recipient row {} in {}: {}",
                row.line,
                path.display(),
                reason
            ),
        }
    }
    if recipients.is_empty() {
        return Err(RosterError::NoValidWallets {
            path: path.display().to_string(),
        }
        .into());
    }
    Ok(recipients)
}

fn read_rows(path: &Path) -> Result<Vec<RawWallet>, RosterError> {
    let content = fs::read_to_string(path).map_err(|source| RosterError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_rows(path, &content)
}

fn parse_rows(path: &Path, content: &str) -> Result<Vec<RawWallet>, RosterError> {
    let looks_like_json = content.trim_start().starts_with(['[', '{']);
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json_rows(path, content),
        Some("csv") | Some("txt") => parse_csv_rows(path, content),
        // Unknown extension: sniff the content.
        _ if looks_like_json => parse_json_rows(path, content),
        _ => parse_csv_rows(path, content),
    }
}

fn parse_csv_rows(path: &Path, content: &str) -> Result<Vec<RawWallet>, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let records: Vec<csv::StringRecord> =
        reader
            .records()
            .collect::<Result<_, _>>()
            .map_err(|e| RosterError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

    let Some(first) = records.first() else {
        return Ok(Vec::new());
    };

    // Headerless files fall back to positional columns: address first,
    // secret key second when present.
    let (address_idx, secret_idx, data_start) = match detect_header(first) {
        Some((address_idx, secret_idx)) => (address_idx, secret_idx, 1),
        None => (Some(0), (first.len() > 1).then_some(1), 0),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (offset, record) in records[data_start..].iter().enumerate() {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        };
        rows.push(RawWallet {
            address: cell(address_idx),
            secret: cell(secret_idx),
            line: data_start + offset + 1,
        });
    }
    Ok(rows)
}

/// Treat the first record as a header when any cell matches a known column
/// name. Returns the guessed address and secret column indices.
fn detect_header(record: &csv::StringRecord) -> Option<(Option<usize>, Option<usize>)> {
    let mut address_idx = None;
    let mut secret_idx = None;
    for (i, cell) in record.iter().enumerate() {
        let name = cell.to_ascii_lowercase();
        if address_idx.is_none() && ADDRESS_COLUMNS.contains(&name.as_str()) {
            address_idx = Some(i);
        } else if secret_idx.is_none() && SECRET_COLUMNS.contains(&name.as_str()) {
            secret_idx = Some(i);
        }
    }
    if address_idx.is_none() && secret_idx.is_none() {
        None
    } else {
        Some((address_idx, secret_idx))
    }
}

fn parse_json_rows(path: &Path, content: &str) -> Result<Vec<RawWallet>, RosterError> {
    let value: Value = serde_json::from_str(content).map_err(|e| RosterError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let Some(items) = value.as_array() else {
        return Err(RosterError::Parse {
            path: path.display().to_string(),
            message: "expected a JSON array of wallets".to_string(),
        });
    };

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let line = i + 1;
        match item {
            Value::String(address) => rows.push(RawWallet {
                address: Some(address.clone()),
                secret: None,
                line,
            }),
            Value::Object(map) => rows.push(RawWallet {
                address: json_field(map, ADDRESS_COLUMNS),
                secret: json_field(map, SECRET_COLUMNS),
                line,
            }),
            _ => {
                warn!(
                    "Discarding entry {} in {}: neither a string nor an object",
                    line,
                    path.display()
                );
            }
        }
    }
    Ok(rows)
}

/// Case-insensitive field lookup. Byte-array values (solana-keygen files)
/// are kept as their JSON text and decoded by [`parse_keypair`].
fn json_field(map: &serde_json::Map<String, Value>, names: &[&str]) -> Option<String> {
    map.iter()
        .find(|(key, _)| names.contains(&key.to_ascii_lowercase().as_str()))
        .and_then(|(_, value)| match value {
            Value::String(s) => Some(s.clone()),
            Value::Array(_) => Some(value.to_string()),
            _ => None,
        })
}

fn donor_from_row(row: &RawWallet) -> Result<Donor, String> {
    let signer = row.secret.as_deref().and_then(parse_keypair);
    if row.secret.is_some() && signer.is_none() {
        warn!(
            "Row {}: unusable signing key, donor is watch-only if it has an address",
            row.line
        );
    }
    let address = row.address.as_deref().map(Pubkey::from_str);

    match (address, signer) {
        (Some(Ok(address)), Some(keypair)) => {
            if keypair.pubkey() != address {
                // The key is what signs; trust it over a stale address column.
                warn!(
                    "Row {}: address column {} does not match keypair {}, using the keypair",
                    row.line,
                    address,
                    keypair.pubkey()
                );
            }
            Ok(Donor::with_signer(keypair))
        }
        (Some(Ok(address)), None) => Ok(Donor::watch_only(address)),
        // Derive-address-from-key fallback.
        (None, Some(keypair)) | (Some(Err(_)), Some(keypair)) => Ok(Donor::with_signer(keypair)),
        (Some(Err(e)), None) => Err(format!("invalid address: {e}")),
        (None, None) => Err("row has neither an address nor a key".to_string()),
    }
}

fn recipient_from_row(row: &RawWallet) -> Result<Recipient, String> {
    let Some(address) = row.address.as_deref() else {
        return Err("row has no address".to_string());
    };
    Pubkey::from_str(address)
        .map(Recipient::new)
        .map_err(|e| format!("invalid address {address}: {e}"))
}

/// Accepts a solana-keygen JSON byte array or a base58-encoded 64-byte
/// keypair. Anything else is unusable.
fn parse_keypair(secret: &str) -> Option<Keypair> {
    let secret = secret.trim();
    if secret.starts_with('[') {
        let bytes: Vec<u8> = serde_json::from_str(secret).ok()?;
        return Keypair::from_bytes(&bytes).ok();
    }
    let bytes = bs58::decode(secret).into_vec().ok()?;
    Keypair::from_bytes(&bytes).ok()
}
