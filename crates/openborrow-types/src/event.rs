//! Events emitted by the settlement router.
//!
//! [`PositionCreated`] is the only channel through which a caller learns the
//! exact committed record; its `info` payload decodes back into the
//! [`OrderRecord`] that `withdrawal` and `liquidate` require.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, IntentKind, OrderRecord, OrderType, PositionId, Result};

/// A position was opened by `borrow` or `lend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCreated {
    pub position_id: PositionId,
    /// Which kind of intent was accepted.
    pub kind: IntentKind,
    /// Initial claim holder (the lender).
    pub claim_holder: Address,
    /// Encoded record, see [`OrderRecord::encode`].
    pub info: Vec<u8>,
}

impl PositionCreated {
    /// Decode the committed record from the event payload.
    ///
    /// # Errors
    /// Returns `Serialization` if the payload is malformed.
    pub fn record(&self) -> Result<OrderRecord> {
        OrderRecord::decode(&self.info)
    }
}

/// A position was repaid before expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionWithdrawn {
    pub position_id: PositionId,
    pub payer: Address,
    pub claim_holder: Address,
    pub interest_paid: Decimal,
    pub refunded: Decimal,
}

/// A position's collateral was seized after expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLiquidated {
    pub position_id: PositionId,
    pub claim_holder: Address,
    pub collateral_seized: Decimal,
}

/// Everything the router emits, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouterEvent {
    AuthorityRegistered {
        order_type: OrderType,
        authority: Address,
    },
    PositionCreated(PositionCreated),
    PositionWithdrawn(PositionWithdrawn),
    PositionLiquidated(PositionLiquidated),
}

impl std::fmt::Display for RouterEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthorityRegistered { .. } => write!(f, "AUTHORITY_REGISTERED"),
            Self::PositionCreated(_) => write!(f, "POSITION_CREATED"),
            Self::PositionWithdrawn(_) => write!(f, "POSITION_WITHDRAWN"),
            Self::PositionLiquidated(_) => write!(f, "POSITION_LIQUIDATED"),
        }
    }
}
