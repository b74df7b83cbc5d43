//! Candidate generation boundary.
//!
//! Workers only see candidates through [`CandidateSource`], so the key
//! primitive can be swapped without touching the search policy.

use std::fmt;

use log::warn;
use secp256k1::{All, Secp256k1};

use crate::crypto::Keypair;

/// One generated keypair and its derived address.
#[derive(Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Normalized hex address without the 0x marker
    pub address: String,
    /// Secret key bytes
    pub private_key: [u8; 32],
    /// BIP-39 recovery phrase, when requested
    pub mnemonic: Option<String>,
}

impl Candidate {
    pub fn new(address: impl Into<String>, private_key: [u8; 32]) -> Self {
        Self {
            address: address.into(),
            private_key,
            mnemonic: None,
        }
    }

    /// Returns the address with its 0x marker.
    pub fn address_prefixed(&self) -> String {
        format!("0x{}", self.address)
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.private_key)
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Produces batches of independent candidates.
///
/// A source belongs to exactly one worker and is never shared.
pub trait CandidateSource {
    /// Generates `batch_size` candidates.
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<Candidate>, SourceError>;

    /// Attaches extra material to the winning candidate.
    fn finish_match(&mut self, candidate: Candidate) -> Candidate {
        candidate
    }
}

impl<S: CandidateSource + ?Sized> CandidateSource for Box<S> {
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<Candidate>, SourceError> {
        (**self).next_batch(batch_size)
    }

    fn finish_match(&mut self, candidate: Candidate) -> Candidate {
        (**self).finish_match(candidate)
    }
}

/// secp256k1 keypairs with Keccak-derived Ethereum addresses.
pub struct KeypairSource {
    secp: Secp256k1<All>,
    case_insensitive: bool,
    with_mnemonic: bool,
}

impl KeypairSource {
    pub fn new(case_insensitive: bool, with_mnemonic: bool) -> Self {
        Self {
            secp: Secp256k1::new(),
            case_insensitive,
            with_mnemonic,
        }
    }
}

impl CandidateSource for KeypairSource {
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<Candidate>, SourceError> {
        Ok((0..batch_size)
            .map(|_| {
                let keypair = Keypair::generate(&self.secp);
                Candidate::new(
                    keypair.address().normalized(self.case_insensitive),
                    *keypair.private_key_bytes(),
                )
            })
            .collect())
    }

    fn finish_match(&mut self, mut candidate: Candidate) -> Candidate {
        if !self.with_mnemonic {
            return candidate;
        }

        match Keypair::from_secret_key(&self.secp, candidate.private_key) {
            Ok(keypair) => match keypair.mnemonic() {
                Ok(phrase) => candidate.mnemonic = Some(phrase),
                Err(e) => warn!("Unable to derive recovery phrase: {}", e),
            },
            Err(e) => warn!("Unable to derive recovery phrase: {}", e),
        }
        candidate
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Key generation failed: {0}")]
    Primitive(String),

    #[error("Invalid secret key: {0}")]
    Secp(#[from] secp256k1::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_and_shape() {
        let mut source = KeypairSource::new(true, false);
        let batch = source.next_batch(8).unwrap();
        assert_eq!(batch.len(), 8);
        for candidate in &batch {
            assert_eq!(candidate.address.len(), 40);
            assert!(candidate
                .address
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
            assert!(candidate.mnemonic.is_none());
        }
        assert_ne!(batch[0].private_key, batch[1].private_key);
    }

    #[test]
    fn test_address_matches_secret() {
        let mut source = KeypairSource::new(false, false);
        let candidate = source.next_batch(1).unwrap().remove(0);

        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, candidate.private_key).unwrap();
        assert_eq!(candidate.address, keypair.address().to_checksum_hex());
        assert_eq!(candidate.address_prefixed(), keypair.address().to_checksum());
    }

    #[test]
    fn test_finish_match_adds_mnemonic_only_when_enabled() {
        let mut plain = KeypairSource::new(true, false);
        let candidate = plain.next_batch(1).unwrap().remove(0);
        assert!(plain.finish_match(candidate).mnemonic.is_none());

        let mut with_phrase = KeypairSource::new(true, true);
        let candidate = with_phrase.next_batch(1).unwrap().remove(0);
        let phrase = with_phrase.finish_match(candidate).mnemonic.unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let candidate = Candidate::new("00", [7u8; 32]);
        let shown = format!("{:?}", candidate);
        assert!(shown.contains("<redacted>"));
        assert!(!shown.contains(&hex::encode([7u8; 32])));
    }
}
