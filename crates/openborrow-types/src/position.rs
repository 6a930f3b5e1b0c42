//! # OrderRecord: the committed state of an open loan
//!
//! The router never stores a position in expanded form. It keeps a
//! [`Commitment`] (SHA-256 over the encoded record) keyed by position id,
//! and every later call supplies the full record, which is re-encoded and
//! compared against the commitment.
//!
//! ## Lifecycle
//!
//! ```text
//!   borrow / lend        withdrawal (now < expiration)
//!  ───────────────▶ OPEN ──────────────────────────────▶ CLOSED
//!                    │
//!                    └───────────────────────────────────▶ CLOSED
//!                        liquidate (now >= expiration)
//! ```
//!
//! The encoding is the nine-word payload carried by the position-created
//! event, in this field order: `order_type, borrower, expiration,
//! principal_asset, principal_amount, collateral_asset, collateral_amount,
//! interest_asset, interest_amount`.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{COMMITMENT_TAG, ORDER_RECORD_WORDS, WORD_SIZE};
use crate::encoding::{read_decimal, read_u64, split_words, word_decimal, word_u64};
use crate::{Address, AssetId, Intent, OrderType, Result};

/// SHA-256 commitment to an encoded [`OrderRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// The accepted state of a loan, as reconstructed by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_type: OrderType,
    pub borrower: Address,
    /// Unix second at which the position becomes liquidatable.
    pub expiration: u64,
    pub principal_asset: AssetId,
    pub principal_amount: Decimal,
    pub collateral_asset: AssetId,
    pub collateral_amount: Decimal,
    pub interest_asset: AssetId,
    pub interest_amount: Decimal,
}

impl OrderRecord {
    /// Build the record for an intent accepted with the given borrower.
    #[must_use]
    pub fn from_intent(intent: &Intent, borrower: Address, expiration: u64) -> Self {
        Self {
            order_type: intent.order_type,
            borrower,
            expiration,
            principal_asset: intent.principal_asset,
            principal_amount: intent.principal_amount,
            collateral_asset: intent.collateral_asset,
            collateral_amount: intent.collateral_amount,
            interest_asset: intent.interest_asset,
            interest_amount: intent.interest_amount,
        }
    }

    /// Stable nine-word encoding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ORDER_RECORD_WORDS * WORD_SIZE);
        out.extend_from_slice(&word_u64(self.order_type.0));
        out.extend_from_slice(self.borrower.as_bytes());
        out.extend_from_slice(&word_u64(self.expiration));
        out.extend_from_slice(self.principal_asset.as_bytes());
        out.extend_from_slice(&word_decimal(self.principal_amount));
        out.extend_from_slice(self.collateral_asset.as_bytes());
        out.extend_from_slice(&word_decimal(self.collateral_amount));
        out.extend_from_slice(self.interest_asset.as_bytes());
        out.extend_from_slice(&word_decimal(self.interest_amount));
        out
    }

    /// Reconstruct a record from an event payload.
    ///
    /// # Errors
    /// Returns `Serialization` if the payload is not exactly nine well-formed
    /// words.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let w = split_words(payload, ORDER_RECORD_WORDS)?;
        Ok(Self {
            order_type: OrderType(read_u64(&w[0])?),
            borrower: Address(w[1]),
            expiration: read_u64(&w[2])?,
            principal_asset: AssetId(w[3]),
            principal_amount: read_decimal(&w[4])?,
            collateral_asset: AssetId(w[5]),
            collateral_amount: read_decimal(&w[6])?,
            interest_asset: AssetId(w[7]),
            interest_amount: read_decimal(&w[8])?,
        })
    }

    /// Commitment stored on-chain for this record.
    #[must_use]
    pub fn commitment(&self) -> Commitment {
        let mut hasher = Sha256::new();
        hasher.update(COMMITMENT_TAG);
        hasher.update(self.encode());
        Commitment(hasher.finalize().into())
    }

    /// Whether the position can still be repaid at `now`.
    #[must_use]
    pub fn is_repayable_at(&self, now: u64) -> bool {
        now < self.expiration
    }

    /// Whether the position can be liquidated at `now`.
    #[must_use]
    pub fn is_liquidatable_at(&self, now: u64) -> bool {
        now >= self.expiration
    }
}
