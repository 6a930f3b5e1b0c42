//! # openborrow-types
//!
//! Shared types, errors, and configuration for the **OpenBorrow** loan
//! settlement engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`AssetId`], [`PositionId`], [`OrderType`], [`IntentKey`]
//! - **Intent model**: [`Intent`], [`IntentKind`], [`SignedIntent`]
//! - **Position model**: [`OrderRecord`], [`Commitment`]
//! - **Events**: [`RouterEvent`], [`PositionCreated`], [`PositionWithdrawn`], [`PositionLiquidated`]
//! - **Configuration**: [`RouterConfig`], [`DomainConfig`], [`InterestPolicy`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`OpenborrowError`] with `OB_ERR_` prefix codes
//! - **Constants**: protocol domain and encoding constants

pub mod clock;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod event;
#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures;
pub mod ids;
pub mod intent;
pub mod position;

// Re-export all primary types at crate root for ergonomic imports:
//   use openborrow_types::{Intent, OrderRecord, PositionId, ...};

pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use intent::*;
pub use position::*;

// Constants and word encoding are accessed via their modules
// (not re-exported to avoid name collisions).
