//! Ethereum keypair generation.

use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};

use super::Address;

/// Represents an Ethereum keypair (private key + derived address).
#[derive(Debug, Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes)
    secret_key: [u8; 32],
    /// The derived Ethereum address
    address: Address,
}

impl Keypair {
    /// Generates a new random keypair using the given signing context.
    ///
    /// Uses the thread-local CSPRNG.
    #[inline]
    pub fn generate(secp: &Secp256k1<All>) -> Self {
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());

        Self {
            secret_key: secret_key.secret_bytes(),
            address: Self::derive_address(&public_key),
        }
    }

    /// Rebuilds a keypair from an existing secret key.
    pub fn from_secret_key(
        secp: &Secp256k1<All>,
        secret_bytes: [u8; 32],
    ) -> Result<Self, secp256k1::Error> {
        let secret_key = SecretKey::from_slice(&secret_bytes)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: secret_bytes,
            address: Self::derive_address(&public_key),
        })
    }

    /// Derives an Ethereum address from a secp256k1 public key.
    ///
    /// Keccak-256 over the 64-byte uncompressed point (0x04 tag dropped),
    /// keeping the last 20 bytes.
    #[inline]
    fn derive_address(public_key: &PublicKey) -> Address {
        let public_key_bytes = public_key.serialize_uncompressed();

        let mut hasher = Keccak::v256();
        hasher.update(&public_key_bytes[1..]);

        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);

        Address::from_bytes(address_bytes)
    }

    /// Returns the BIP-39 English phrase that encodes the secret as entropy.
    ///
    /// 32 bytes of entropy always yield 24 words.
    pub fn mnemonic(&self) -> Result<String, bip39::Error> {
        Ok(bip39::Mnemonic::from_entropy(&self.secret_key)?.to_string())
    }

    /// Returns the private key as a hex string (without 0x prefix).
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key)
    }

    /// Returns the private key bytes.
    pub fn private_key_bytes(&self) -> &[u8; 32] {
        &self.secret_key
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}
