//! Supply conservation invariant checker.
//!
//! Invariant enforced by the in-memory ledger:
//! ```text
//! ∀ asset: Σ balances (parties + escrow) == Σ minted - Σ burned
//! ```
//!
//! Settlement only moves value between accounts and escrow. If this
//! invariant ever breaks, value was created or destroyed by a transfer.

use std::collections::HashMap;

use openborrow_types::{AssetId, OpenborrowError, Result};
use rust_decimal::Decimal;

/// Tracks per-asset issuance so balances can be checked against it.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    /// Total minted per asset since genesis.
    minted: HashMap<AssetId, Decimal>,
    /// Total burned per asset since genesis.
    burned: HashMap<AssetId, Decimal>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, asset: AssetId, amount: Decimal) {
        *self.minted.entry(asset).or_insert(Decimal::ZERO) += amount;
    }

    pub fn record_burn(&mut self, asset: AssetId, amount: Decimal) {
        *self.burned.entry(asset).or_insert(Decimal::ZERO) += amount;
    }

    /// Expected total supply for an asset: minted - burned.
    #[must_use]
    pub fn expected_supply(&self, asset: &AssetId) -> Decimal {
        let minted = self.minted.get(asset).copied().unwrap_or(Decimal::ZERO);
        let burned = self.burned.get(asset).copied().unwrap_or(Decimal::ZERO);
        minted - burned
    }

    /// Verify that the actual supply matches the issued supply.
    ///
    /// # Errors
    /// Returns [`OpenborrowError::Internal`] if actual ≠ expected.
    pub fn verify(&self, asset: &AssetId, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(OpenborrowError::Internal(format!(
                "supply invariant violated for {asset}: actual {actual_supply} != expected {expected}"
            )));
        }
        Ok(())
    }

    /// Every asset ever minted.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self.minted.keys().copied().collect();
        assets.sort();
        assets
    }
}
