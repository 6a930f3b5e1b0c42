//! The order authority abstraction and its default ed25519 implementation.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use openborrow_types::{Address, DomainConfig, Intent, IntentKind};

use crate::domain::{domain_separator, struct_hash, typed_digest};

/// Verification context supplied by the router: the protocol domain and the
/// execution context every digest is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainContext {
    /// Protocol name and version.
    pub domain: DomainConfig,
    /// Execution-context (chain) identifier.
    pub chain_id: u64,
}

impl DomainContext {
    #[must_use]
    pub fn new(domain: DomainConfig, chain_id: u64) -> Self {
        Self { domain, chain_id }
    }
}

/// Decides whether a signed intent was authored by the party it names.
///
/// Implementations are pure: no state changes, no side effects. The router
/// selects one per intent by its `order_type` index, so adding a signature
/// scheme means registering another implementation.
pub trait OrderAuthority: Send + Sync {
    /// The authority's own address, bound into its signature domain.
    fn address(&self) -> Address;

    /// `true` iff `signature` is `expected_signer`'s signature over the
    /// intent's digest under this authority's domain for `ctx`.
    fn verify(
        &self,
        kind: IntentKind,
        intent: &Intent,
        signature: &[u8],
        expected_signer: &Address,
        ctx: &DomainContext,
    ) -> bool;
}

/// Default authority: ed25519 signatures over the SHA-256 typed-data digest.
///
/// The signer's address is its ed25519 verifying key.
#[derive(Debug, Clone)]
pub struct Ed25519Authority {
    address: Address,
}

impl Ed25519Authority {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// The digest a signer must sign for this authority.
    #[must_use]
    pub fn digest(&self, kind: IntentKind, intent: &Intent, ctx: &DomainContext) -> [u8; 32] {
        let separator = domain_separator(&ctx.domain, ctx.chain_id, &self.address);
        typed_digest(&separator, &struct_hash(kind, intent))
    }

    /// Off-chain signing: produce the signature [`verify`](OrderAuthority::verify)
    /// accepts for the key's address.
    #[must_use]
    pub fn sign(
        &self,
        key: &SigningKey,
        kind: IntentKind,
        intent: &Intent,
        ctx: &DomainContext,
    ) -> Vec<u8> {
        key.sign(&self.digest(kind, intent, ctx)).to_bytes().to_vec()
    }
}

impl OrderAuthority for Ed25519Authority {
    fn address(&self) -> Address {
        self.address
    }

    fn verify(
        &self,
        kind: IntentKind,
        intent: &Intent,
        signature: &[u8],
        expected_signer: &Address,
        ctx: &DomainContext,
    ) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(expected_signer.as_bytes()) else {
            tracing::warn!(signer = %expected_signer, "Signer address is not an ed25519 key");
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            tracing::warn!(
                signer = %expected_signer,
                len = signature.len(),
                "Malformed signature"
            );
            return false;
        };
        key.verify_strict(&self.digest(kind, intent, ctx), &signature)
            .is_ok()
    }
}
