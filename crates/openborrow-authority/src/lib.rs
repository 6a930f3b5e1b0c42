//! # openborrow-authority
//!
//! **Order authorities**: decide whether a signed loan intent was authored
//! by the party it claims to represent.
//!
//! ## Architecture
//!
//! - [`OrderAuthority`]: pure verification interface, one per signature scheme
//! - [`Ed25519Authority`]: default scheme, ed25519 over a domain-separated
//!   SHA-256 typed-data digest
//! - [`AuthorityRegistry`]: append-only list indexed by an intent's `order_type`
//!
//! ## Domain binding
//!
//! Every digest binds protocol name, version, chain id and the verifying
//! authority's address, so a signature cannot be replayed on another chain
//! or against another authority.

pub mod authority;
pub mod domain;
pub mod registry;

pub use authority::{DomainContext, Ed25519Authority, OrderAuthority};
pub use registry::AuthorityRegistry;
