//! Error types for the OpenBorrow settlement engine.
//!
//! All errors use the `OB_ERR_` prefix convention for easy grepping in logs.
//! Every error aborts the whole call; none leaves partial state behind.
//! Error codes are grouped by failure class:
//! - 1xx: Authenticity errors
//! - 2xx: Temporal errors
//! - 3xx: Replay / state errors
//! - 4xx: Authorization errors
//! - 5xx: Funds errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, AssetId, IntentKey, OrderType, PositionId};

/// Central error enum for all OpenBorrow operations.
#[derive(Debug, Error)]
pub enum OpenborrowError {
    // =================================================================
    // Authenticity Errors (1xx)
    // =================================================================
    /// The order authority rejected the intent's signature.
    #[error("OB_ERR_100: Invalid signature for {0}")]
    InvalidSignature(IntentKey),

    /// No authority is registered for the intent's order type.
    #[error("OB_ERR_101: Unknown order type: {0}")]
    UnknownOrderType(OrderType),

    /// The intent is restricted to a different counterparty.
    #[error("OB_ERR_102: Counterparty mismatch: intent limited to {expected}, accepted by {actual}")]
    CounterpartyMismatch { expected: Address, actual: Address },

    /// The intent is structurally invalid.
    #[error("OB_ERR_103: Invalid intent: {reason}")]
    InvalidIntent { reason: String },

    // =================================================================
    // Temporal Errors (2xx)
    // =================================================================
    /// The intent's acceptance deadline has passed.
    #[error("OB_ERR_200: Intent deadline expired: deadline {deadline}, now {now}")]
    DeadlineExpired { deadline: u64, now: u64 },

    /// The position has reached expiration; only liquidation remains.
    #[error("OB_ERR_201: {position} expired at {expiration}, now {now}")]
    PositionExpired {
        position: PositionId,
        expiration: u64,
        now: u64,
    },

    /// The position has not reached expiration yet.
    #[error("OB_ERR_202: {position} not yet expired: expires at {expiration}, now {now}")]
    NotYetExpired {
        position: PositionId,
        expiration: u64,
        now: u64,
    },

    // =================================================================
    // Replay / State Errors (3xx)
    // =================================================================
    /// The signed intent has already been consumed.
    #[error("OB_ERR_300: Intent already used: {0}")]
    IntentAlreadyUsed(IntentKey),

    /// No open position matches the id and supplied record.
    #[error("OB_ERR_301: Position not found: {0}")]
    PositionNotFound(PositionId),

    /// The claim token does not exist.
    #[error("OB_ERR_302: Claim not found: {0}")]
    ClaimNotFound(PositionId),

    /// A claim token with this id already exists.
    #[error("OB_ERR_303: Claim already exists: {0}")]
    ClaimAlreadyExists(PositionId),

    // =================================================================
    // Authorization Errors (4xx)
    // =================================================================
    /// The caller may not close this position.
    #[error("OB_ERR_400: Caller {caller} is not the claim holder of {position}")]
    NotClaimHolder {
        caller: Address,
        position: PositionId,
    },

    /// The caller is not the owner of the router.
    #[error("OB_ERR_401: Caller {0} is not the owner")]
    NotOwner(Address),

    /// The caller is not the claim token administrator.
    #[error("OB_ERR_402: Caller {0} is not the claim admin")]
    NotClaimAdmin(Address),

    // =================================================================
    // Funds Errors (5xx)
    // =================================================================
    /// The payer does not hold enough of the asset.
    #[error("OB_ERR_500: Insufficient balance of {asset} for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        holder: Address,
        needed: Decimal,
        available: Decimal,
    },

    /// The payer has not approved enough of the asset for the router.
    #[error("OB_ERR_501: Insufficient allowance of {asset} from {holder}: need {needed}, approved {approved}")]
    InsufficientAllowance {
        asset: AssetId,
        holder: Address,
        needed: Decimal,
        approved: Decimal,
    },

    /// The repayment does not cover the interest owed.
    #[error("OB_ERR_502: Insufficient interest payment: need {needed}, supplied {supplied}")]
    InsufficientInterest { needed: Decimal, supplied: Decimal },

    /// The repayment exceeds the configured overpayment cap.
    #[error("OB_ERR_503: Excessive payment: cap {cap}, supplied {supplied}")]
    ExcessivePayment { cap: Decimal, supplied: Decimal },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("OB_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenborrowError>;

impl From<serde_json::Error> for OpenborrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
