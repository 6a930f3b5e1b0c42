//! Signed loan intents.
//!
//! An intent is an off-chain offer: a lender offering principal (a `Lend`
//! intent, accepted by a borrower through `borrow`) or a borrower requesting
//! it (a `Borrow` intent, accepted by a lender through `lend`). Intents are
//! never persisted; the router consumes each one at most once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, AssetId, IntentKey, OpenborrowError, OrderType, Result};

/// Which side signed the intent. Selects the typed-data schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    /// Signed by a lender; the counterparty field names the borrower.
    Lend,
    /// Signed by a borrower; the counterparty field names the lender.
    Borrow,
}

impl IntentKind {
    /// Typed-data struct name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Lend => "Lend",
            Self::Borrow => "Borrow",
        }
    }

    /// Name of the counterparty-limit field in the typed-data schema.
    #[must_use]
    pub fn counterparty_field(self) -> &'static str {
        match self {
            Self::Lend => "borrower",
            Self::Borrow => "lender",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lend => write!(f, "LEND"),
            Self::Borrow => write!(f, "BORROW"),
        }
    }
}

/// The signed fields of a loan offer, in typed-data field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Signer-chosen identifier, unique per `(signer, order_type)`.
    pub id: u64,
    /// Selects the order authority that verifies the signature.
    pub order_type: OrderType,
    /// Loan term in seconds, counted from acceptance.
    pub duration: u64,
    /// Last unix second at which the intent may be accepted.
    pub deadline: u64,
    pub principal_asset: AssetId,
    pub principal_amount: Decimal,
    pub collateral_asset: AssetId,
    pub collateral_amount: Decimal,
    pub interest_asset: AssetId,
    pub interest_amount: Decimal,
    /// Only this address may accept. [`Address::ZERO`] admits anyone.
    pub counterparty_limit: Address,
}

impl Intent {
    /// Reject structurally unusable intents before any signature work.
    ///
    /// # Errors
    /// Returns `InvalidIntent` if any amount is negative.
    pub fn validate(&self) -> Result<()> {
        for (name, amount) in [
            ("principal", self.principal_amount),
            ("collateral", self.collateral_amount),
            ("interest", self.interest_amount),
        ] {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(OpenborrowError::InvalidIntent {
                    reason: format!("{name} amount is negative: {amount}"),
                });
            }
        }
        Ok(())
    }

    /// Whether `acceptor` is allowed by the counterparty limit.
    #[must_use]
    pub fn admits(&self, acceptor: &Address) -> bool {
        self.counterparty_limit.is_zero() || self.counterparty_limit == *acceptor
    }

    /// Expiration timestamp for a position accepted at `now`.
    ///
    /// # Errors
    /// Returns `InvalidIntent` if `now + duration` overflows.
    pub fn expiration_from(&self, now: u64) -> Result<u64> {
        now.checked_add(self.duration)
            .ok_or_else(|| OpenborrowError::InvalidIntent {
                reason: format!("duration {} overflows from {now}", self.duration),
            })
    }
}

/// An intent together with its author and signature, as submitted on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedIntent {
    pub intent: Intent,
    /// The party that signed: the lender for `Lend`, the borrower for `Borrow`.
    pub signer: Address,
    /// Raw signature bytes, interpreted by the selected authority.
    pub signature: Vec<u8>,
}

impl SignedIntent {
    /// Replay key of this intent.
    #[must_use]
    pub fn key(&self) -> IntentKey {
        IntentKey {
            signer: self.signer,
            order_type: self.intent.order_type,
            id: self.intent.id,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Intent {
    /// The offer used across the test suites: 1000 of `tokenA` against 2000
    /// of `tokenB`, 100 native interest, thirty days, open to anyone.
    pub fn dummy(id: u64, deadline: u64) -> Self {
        Self {
            id,
            order_type: OrderType(0),
            duration: 30 * 24 * 3600,
            deadline,
            principal_asset: AssetId::named("tokenA"),
            principal_amount: Decimal::new(1000, 0),
            collateral_asset: AssetId::named("tokenB"),
            collateral_amount: Decimal::new(2000, 0),
            interest_asset: AssetId::NATIVE,
            interest_amount: Decimal::new(100, 0),
            counterparty_limit: Address::ZERO,
        }
    }
}
