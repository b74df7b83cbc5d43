//! Cryptographic primitive behind each search candidate.
//!
//! This module provides:
//! - Random secp256k1 key generation
//! - Ethereum address derivation using Keccak-256 and EIP-55 checksums
//! - BIP-39 recovery phrases for found keys

mod address;
mod keypair;

pub use address::Address;
pub use keypair::Keypair;
