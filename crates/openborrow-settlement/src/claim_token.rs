//! # ClaimToken: transferable right to close a position
//!
//! One non-fungible claim per open position, sharing the position's id.
//! Its owner is the lender side: the party that receives repayment or
//! seized collateral, and the party that may transfer that right onward.
//!
//! ## State Machine
//!
//! ```text
//!             mint (admin)            burn (admin)
//!   (absent) ─────────────▶ OWNED ───────────────▶ (absent, terminal)
//!                            │  ▲
//!                            └──┘ transfer (owner)
//! ```
//!
//! Only the admin may mint or burn. The admin is handed to the router once
//! at deployment.

use std::collections::HashMap;

use openborrow_types::{Address, OpenborrowError, PositionId, Result};

/// Ownership table of claim tokens.
#[derive(Debug)]
pub struct ClaimToken {
    admin: Address,
    owners: HashMap<PositionId, Address>,
}

impl ClaimToken {
    #[must_use]
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            owners: HashMap::new(),
        }
    }

    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }

    fn ensure_admin(&self, caller: Address) -> Result<()> {
        if caller != self.admin {
            return Err(OpenborrowError::NotClaimAdmin(caller));
        }
        Ok(())
    }

    /// Hand administrative control to `new_admin`.
    ///
    /// # Errors
    /// Returns `NotClaimAdmin` unless `caller` is the current admin.
    pub fn transfer_admin(&mut self, caller: Address, new_admin: Address) -> Result<()> {
        self.ensure_admin(caller)?;
        self.admin = new_admin;
        Ok(())
    }

    /// # Errors
    /// `NotClaimAdmin` for non-admin callers, `ClaimAlreadyExists` if `id`
    /// is already minted.
    pub fn mint(&mut self, caller: Address, to: Address, id: PositionId) -> Result<()> {
        self.ensure_admin(caller)?;
        if self.owners.contains_key(&id) {
            return Err(OpenborrowError::ClaimAlreadyExists(id));
        }
        self.owners.insert(id, to);
        tracing::debug!(claim = %id, owner = %to, "Claim minted");
        Ok(())
    }

    /// # Errors
    /// `NotClaimAdmin` for non-admin callers, `ClaimNotFound` if `id` does
    /// not exist.
    pub fn burn(&mut self, caller: Address, id: PositionId) -> Result<Address> {
        self.ensure_admin(caller)?;
        let owner = self
            .owners
            .remove(&id)
            .ok_or(OpenborrowError::ClaimNotFound(id))?;
        tracing::debug!(claim = %id, owner = %owner, "Claim burned");
        Ok(owner)
    }

    /// Move a claim to a new holder. Only the current holder may do so.
    ///
    /// # Errors
    /// `ClaimNotFound` if `id` does not exist, `NotClaimHolder` if `caller`
    /// does not own it.
    pub fn transfer(&mut self, caller: Address, to: Address, id: PositionId) -> Result<()> {
        let owner = self
            .owners
            .get_mut(&id)
            .ok_or(OpenborrowError::ClaimNotFound(id))?;
        if *owner != caller {
            return Err(OpenborrowError::NotClaimHolder {
                caller,
                position: id,
            });
        }
        *owner = to;
        tracing::debug!(claim = %id, from = %caller, to = %to, "Claim transferred");
        Ok(())
    }

    /// # Errors
    /// `ClaimNotFound` if `id` does not exist.
    pub fn owner_of(&self, id: PositionId) -> Result<Address> {
        self.owners
            .get(&id)
            .copied()
            .ok_or(OpenborrowError::ClaimNotFound(id))
    }

    #[must_use]
    pub fn exists(&self, id: PositionId) -> bool {
        self.owners.contains_key(&id)
    }

    /// Number of claims held by `holder`.
    #[must_use]
    pub fn balance_of(&self, holder: &Address) -> usize {
        self.owners.values().filter(|o| *o == holder).count()
    }

    /// Number of live claims.
    #[must_use]
    pub fn total(&self) -> usize {
        self.owners.len()
    }
}
