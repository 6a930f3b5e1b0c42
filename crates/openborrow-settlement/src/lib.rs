//! # openborrow-settlement
//!
//! **Settlement**: intent acceptance, collateral escrow, claim tokens,
//! repayment and liquidation.
//!
//! ## Architecture
//!
//! The [`SettlementRouter`] receives a signed intent and:
//! 1. Checks the deadline, replay set and counterparty limit
//! 2. Verifies the signature through the intent's order authority
//! 3. Moves principal to the borrower and collateral into escrow
//! 4. Commits the position record and mints a [`ClaimToken`] to the lender
//!
//! A position then ends in exactly one of two ways:
//!
//! - **Withdrawal**: before expiration, principal and interest go to the
//!   claim holder, collateral returns to the borrower
//! - **Liquidation**: at or after expiration, collateral goes to the claim
//!   holder
//!
//! Funds move through an [`AssetTransferAdapter`]; [`InMemoryLedger`] is the
//! reference implementation, with [`SupplyConservation`] checks.

pub mod claim_token;
pub mod ledger;
pub mod router;
pub mod supply_conservation;
pub mod used_intents;

pub use claim_token::ClaimToken;
pub use ledger::{AssetTransferAdapter, InMemoryLedger, Transfer};
pub use router::SettlementRouter;
pub use supply_conservation::SupplyConservation;
pub use used_intents::UsedIntentSet;
