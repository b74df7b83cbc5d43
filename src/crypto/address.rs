//! Ethereum address representation and utilities.

use std::fmt;

use tiny_keccak::{Hasher, Keccak};

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the EIP-55 mixed-case hex string (without 0x prefix).
    pub fn to_checksum_hex(&self) -> String {
        let hex_addr = self.to_hex();
        let mut hasher = Keccak::v256();
        hasher.update(hex_addr.as_bytes());
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        hex_addr
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let nibble = if i % 2 == 0 {
                    hash[i / 2] >> 4
                } else {
                    hash[i / 2] & 0x0f
                };
                if nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }

    /// Returns the address with checksum encoding (EIP-55) and 0x prefix.
    pub fn to_checksum(&self) -> String {
        format!("0x{}", self.to_checksum_hex())
    }

    /// Returns the hex form the matcher compares against.
    ///
    /// Case-insensitive searches compare lowercase hex; case-sensitive ones
    /// compare the checksum casing, which is what wallets display.
    pub fn normalized(&self, case_insensitive: bool) -> String {
        if case_insensitive {
            self.to_hex()
        } else {
            self.to_checksum_hex()
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}
