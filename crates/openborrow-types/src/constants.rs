//! System-wide constants for the OpenBorrow settlement engine.

/// Protocol name bound into every typed-data domain.
pub const DOMAIN_NAME: &str = "openBorrow";

/// Protocol version bound into every typed-data domain.
pub const DOMAIN_VERSION: &str = "v1.0.0";

/// Default execution-context (chain) identifier.
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Width of one word in the position encoding.
pub const WORD_SIZE: usize = 32;

/// Number of words in an encoded [`OrderRecord`](crate::OrderRecord).
pub const ORDER_RECORD_WORDS: usize = 9;

/// Domain tag hashed in front of an encoded position to form its commitment.
pub const COMMITMENT_TAG: &[u8] = b"openborrow:position:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenBorrow";
