use std::fmt;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};

/// A wallet being checked for, and potentially receiving, funding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: Pubkey,
}

impl Recipient {
    pub fn new(address: Pubkey) -> Self {
        Self { address }
    }
}

/// A wallet that can be checked as a funding source and, when it holds a
/// signing key, used to initiate transfers.
#[derive(Clone)]
pub struct Donor {
    pub address: Pubkey,
    pub signer: Option<Arc<Keypair>>,
}

impl Donor {
    /// A donor whose outgoing transfers can be recognized but which can
    /// never be selected for disbursement.
    pub fn watch_only(address: Pubkey) -> Self {
        Self {
            address,
            signer: None,
        }
    }

    pub fn with_signer(keypair: Keypair) -> Self {
        Self {
            address: keypair.pubkey(),
            signer: Some(Arc::new(keypair)),
        }
    }

    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }
}

// Never print key material.
impl fmt::Debug for Donor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Donor")
            .field("address", &self.address)
            .field("can_sign", &self.can_sign())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_donor_derives_its_address() {
        let keypair = Keypair::new();
        let expected = keypair.pubkey();
        let donor = Donor::with_signer(keypair);
        assert_eq!(donor.address, expected);
        assert!(donor.can_sign());
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let donor = Donor::with_signer(Keypair::new());
        let output = format!("{donor:?}");
        assert!(output.contains("can_sign"));
        assert!(!output.to_lowercase().contains("keypair"));
    }
}
