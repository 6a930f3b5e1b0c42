//! Typed-data hashing for loan intents.
//!
//! The digest an authority verifies is
//!
//! ```text
//! digest      = SHA-256(0x19 || 0x01 || domain_separator || struct_hash)
//! domain_sep  = SHA-256(H(DOMAIN_TYPE) || H(name) || H(version) || chainId || verifyingContract)
//! struct_hash = SHA-256(H(INTENT_TYPE) || id || orderType || duration || deadline || ... || counterparty)
//! ```
//!
//! where every field is one 32-byte word (see `openborrow_types::encoding`).
//! Binding the authority's own address as `verifyingContract` means a
//! signature made for one authority or chain never verifies under another.

use openborrow_types::encoding::{word_decimal, word_u64};
use openborrow_types::{Address, DomainConfig, Intent, IntentKind};
use sha2::{Digest, Sha256};

/// Schema of the domain struct.
pub const DOMAIN_TYPE: &str =
    "OpenBorrowDomain(string name,string version,uint64 chainId,bytes32 verifyingContract)";

fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Schema string of the intent struct for `kind`.
#[must_use]
pub fn intent_type(kind: IntentKind) -> String {
    format!(
        "{}(uint64 id,uint64 orderType,uint64 duration,uint64 deadline,\
         bytes32 principalAsset,decimal principalAmount,\
         bytes32 collateralAsset,decimal collateralAmount,\
         bytes32 interestAsset,decimal interestAmount,bytes32 {})",
        kind.type_name(),
        kind.counterparty_field()
    )
}

/// Domain separator for one authority on one chain.
#[must_use]
pub fn domain_separator(domain: &DomainConfig, chain_id: u64, verifying: &Address) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(sha256(DOMAIN_TYPE.as_bytes()));
    hasher.update(sha256(domain.name.as_bytes()));
    hasher.update(sha256(domain.version.as_bytes()));
    hasher.update(word_u64(chain_id));
    hasher.update(verifying.as_bytes());
    hasher.finalize().into()
}

/// Hash of the intent's fields under the `kind` schema.
#[must_use]
pub fn struct_hash(kind: IntentKind, intent: &Intent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(sha256(intent_type(kind).as_bytes()));
    hasher.update(word_u64(intent.id));
    hasher.update(word_u64(intent.order_type.0));
    hasher.update(word_u64(intent.duration));
    hasher.update(word_u64(intent.deadline));
    hasher.update(intent.principal_asset.as_bytes());
    hasher.update(word_decimal(intent.principal_amount));
    hasher.update(intent.collateral_asset.as_bytes());
    hasher.update(word_decimal(intent.collateral_amount));
    hasher.update(intent.interest_asset.as_bytes());
    hasher.update(word_decimal(intent.interest_amount));
    hasher.update(intent.counterparty_limit.as_bytes());
    hasher.finalize().into()
}

/// Final digest that gets signed.
#[must_use]
pub fn typed_digest(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([0x19, 0x01]);
    hasher.update(domain_separator);
    hasher.update(struct_hash);
    hasher.finalize().into()
}
