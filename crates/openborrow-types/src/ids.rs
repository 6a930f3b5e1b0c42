//! Identifiers used throughout OpenBorrow.
//!
//! Parties, assets and contracts are all addressed by 32-byte values.
//! A party's address is its raw ed25519 public key, so the signer of an
//! intent can be checked directly against the address it claims.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account address.
///
/// For signing parties this is the ed25519 verifying key. Contract-like
/// actors (router, authorities, escrow) use [`Address::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. As a counterparty limit it means "anyone".
    pub const ZERO: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Address of the party holding the matching ed25519 signing key.
    #[must_use]
    pub fn from_verifying_key(key: &ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Deterministic address for a named, non-signing actor.
    #[must_use]
    pub fn derive(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"openborrow:address:v1:");
        hasher.update(label.as_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AssetId
// ---------------------------------------------------------------------------

/// Identifier of a fungible asset. The zero id is the native asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    /// The chain's native asset.
    pub const NATIVE: Self = Self([0u8; 32]);

    /// Deterministic id for a named token (e.g. `"tokenA"`).
    #[must_use]
    pub fn named(symbol: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"openborrow:asset:v1:");
        hasher.update(symbol.as_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            write!(f, "asset:{}", hex::encode(&self.0[..4]))
        }
    }
}

// ---------------------------------------------------------------------------
// PositionId
// ---------------------------------------------------------------------------

/// Sequence-assigned identifier of an open position. Equal to the id of the
/// claim token minted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl PositionId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// OrderType
// ---------------------------------------------------------------------------

/// Index of the order authority an intent is verified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderType(pub u64);

impl OrderType {
    /// Registry slot for this order type, if it fits in `usize`.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order_type:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// IntentKey
// ---------------------------------------------------------------------------

/// Uniqueness key of a signed intent: `(signer, order_type, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct IntentKey {
    pub signer: Address,
    pub order_type: OrderType,
    pub id: u64,
}

impl fmt::Display for IntentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent:{}/{}/{}", self.signer.short(), self.order_type.0, self.id)
    }
}
