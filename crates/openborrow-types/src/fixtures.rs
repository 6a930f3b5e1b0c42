//! Deterministic key fixtures. **Never use in production.**

use ed25519_dalek::SigningKey;

use crate::Address;

/// A signing party: its ed25519 key and the address derived from it.
#[derive(Debug, Clone)]
pub struct Party {
    pub key: SigningKey,
    pub address: Address,
}

impl Party {
    /// Party whose secret key is `seed` repeated 32 times.
    #[must_use]
    pub fn from_seed(seed: u8) -> Self {
        Self::from_secret([seed; 32])
    }

    /// Party with a random secret key.
    #[must_use]
    pub fn random() -> Self {
        Self::from_secret(rand::random::<[u8; 32]>())
    }

    fn from_secret(secret: [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(&secret);
        let address = Address::from_verifying_key(&key.verifying_key());
        Self { key, address }
    }
}
