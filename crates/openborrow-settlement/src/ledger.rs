//! Asset custody: the transfer interface the router moves funds through,
//! and an in-memory ledger implementing it.
//!
//! The router is the ledger's *operator*: it spends from other accounts only
//! up to what they approved, and its own account is the escrow.

use std::collections::HashMap;

use openborrow_types::{Address, AssetId, OpenborrowError, Result};
use rust_decimal::Decimal;

use crate::supply_conservation::SupplyConservation;

/// One leg of fund movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub asset: AssetId,
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
}

impl Transfer {
    #[must_use]
    pub fn new(asset: AssetId, from: Address, to: Address, amount: Decimal) -> Self {
        Self {
            asset,
            from,
            to,
            amount,
        }
    }
}

/// Fungible-asset transfer interface consumed by the router.
///
/// Fails fast with `InsufficientBalance` or `InsufficientAllowance`.
pub trait AssetTransferAdapter {
    /// Apply every transfer in order, or none of them.
    ///
    /// Later legs may spend value credited by earlier legs.
    fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<()>;

    fn balance_of(&self, asset: &AssetId, holder: &Address) -> Decimal;

    fn transfer(&mut self, asset: AssetId, from: Address, to: Address, amount: Decimal) -> Result<()> {
        self.transfer_all(&[Transfer::new(asset, from, to, amount)])
    }
}

/// Prior value of a slot touched during a batch.
enum JournalEntry {
    Balance((AssetId, Address), Option<Decimal>),
    Allowance((AssetId, Address), Option<Decimal>),
}

/// Balances and operator allowances kept in memory.
#[derive(Debug)]
pub struct InMemoryLedger {
    /// Spender of approved funds and holder of escrow.
    operator: Address,
    balances: HashMap<(AssetId, Address), Decimal>,
    /// Amount each `(asset, owner)` has approved the operator to spend.
    allowances: HashMap<(AssetId, Address), Decimal>,
    supply: SupplyConservation,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            supply: SupplyConservation::new(),
        }
    }

    #[must_use]
    pub fn operator(&self) -> Address {
        self.operator
    }

    /// Issue new units to `to`.
    pub fn mint(&mut self, asset: AssetId, to: Address, amount: Decimal) {
        *self.balances.entry((asset, to)).or_insert(Decimal::ZERO) += amount;
        self.supply.record_mint(asset, amount);
    }

    /// Destroy units held by `from`.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` holds less than `amount`.
    pub fn burn(&mut self, asset: AssetId, from: Address, amount: Decimal) -> Result<()> {
        let available = self.balance_of(&asset, &from);
        if available < amount {
            return Err(OpenborrowError::InsufficientBalance {
                asset,
                holder: from,
                needed: amount,
                available,
            });
        }
        self.balances.insert((asset, from), available - amount);
        self.supply.record_burn(asset, amount);
        Ok(())
    }

    /// Set how much of `asset` the operator may pull from `owner`.
    pub fn approve(&mut self, owner: Address, asset: AssetId, amount: Decimal) {
        self.allowances.insert((asset, owner), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: &Address, asset: &AssetId) -> Decimal {
        self.allowances
            .get(&(*asset, *owner))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of every account's balance of `asset`, escrow included.
    #[must_use]
    pub fn total_balance(&self, asset: &AssetId) -> Decimal {
        self.balances
            .iter()
            .filter(|((a, _), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Verify supply conservation for a given asset.
    pub fn verify_supply(&self, asset: &AssetId) -> Result<()> {
        self.supply.verify(asset, self.total_balance(asset))
    }

    /// Verify supply conservation for every asset ever minted.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }

    fn apply(&mut self, t: &Transfer, journal: &mut Vec<JournalEntry>) -> Result<()> {
        if t.amount.is_sign_negative() && !t.amount.is_zero() {
            return Err(OpenborrowError::Internal(format!(
                "negative transfer of {} {}",
                t.amount, t.asset
            )));
        }
        if t.amount.is_zero() {
            return Ok(());
        }

        if t.from != self.operator {
            let approved = self.allowance(&t.from, &t.asset);
            if approved < t.amount {
                return Err(OpenborrowError::InsufficientAllowance {
                    asset: t.asset,
                    holder: t.from,
                    needed: t.amount,
                    approved,
                });
            }
            let key = (t.asset, t.from);
            journal.push(JournalEntry::Allowance(key, self.allowances.get(&key).copied()));
            self.allowances.insert(key, approved - t.amount);
        }

        let available = self.balance_of(&t.asset, &t.from);
        if available < t.amount {
            return Err(OpenborrowError::InsufficientBalance {
                asset: t.asset,
                holder: t.from,
                needed: t.amount,
                available,
            });
        }

        let from_key = (t.asset, t.from);
        journal.push(JournalEntry::Balance(from_key, self.balances.get(&from_key).copied()));
        self.balances.insert(from_key, available - t.amount);

        let to_key = (t.asset, t.to);
        let prior = self.balances.get(&to_key).copied();
        let credited = prior
            .unwrap_or(Decimal::ZERO)
            .checked_add(t.amount)
            .ok_or_else(|| {
                OpenborrowError::Internal(format!("balance overflow crediting {} {}", t.amount, t.asset))
            })?;
        journal.push(JournalEntry::Balance(to_key, prior));
        self.balances.insert(to_key, credited);
        Ok(())
    }

    fn rollback(&mut self, journal: Vec<JournalEntry>) {
        for entry in journal.into_iter().rev() {
            let (map, key, prior) = match entry {
                JournalEntry::Balance(key, prior) => (&mut self.balances, key, prior),
                JournalEntry::Allowance(key, prior) => (&mut self.allowances, key, prior),
            };
            match prior {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
    }
}

impl AssetTransferAdapter for InMemoryLedger {
    fn transfer_all(&mut self, transfers: &[Transfer]) -> Result<()> {
        let mut journal = Vec::with_capacity(transfers.len() * 3);
        for t in transfers {
            if let Err(err) = self.apply(t, &mut journal) {
                self.rollback(journal);
                return Err(err);
            }
        }
        Ok(())
    }

    fn balance_of(&self, asset: &AssetId, holder: &Address) -> Decimal {
        self.balances
            .get(&(*asset, *holder))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}
