//! Append-only registry of order authorities, indexed by order type.

use openborrow_types::{Address, OpenborrowError, OrderType, Result};

use crate::authority::OrderAuthority;

/// Ordered list of authorities. Slot `n` verifies intents with
/// `order_type == n`. Authorities are never removed.
pub struct AuthorityRegistry {
    authorities: Vec<Box<dyn OrderAuthority>>,
}

impl AuthorityRegistry {
    /// Registry whose order type 0 is `default_authority`.
    #[must_use]
    pub fn new(default_authority: Box<dyn OrderAuthority>) -> Self {
        Self {
            authorities: vec![default_authority],
        }
    }

    /// Append an authority and return the order type it serves.
    ///
    /// # Errors
    /// Returns `Internal` if the next slot does not fit an order type.
    pub fn register(&mut self, authority: Box<dyn OrderAuthority>) -> Result<OrderType> {
        let slot = u64::try_from(self.authorities.len()).map_err(|_| {
            OpenborrowError::Internal("authority registry exceeds u64 order types".into())
        })?;
        self.authorities.push(authority);
        Ok(OrderType(slot))
    }

    /// The authority serving `order_type`, if registered.
    #[must_use]
    pub fn get(&self, order_type: OrderType) -> Option<&dyn OrderAuthority> {
        order_type
            .index()
            .and_then(|i| self.authorities.get(i))
            .map(|a| &**a)
    }

    /// Address of the authority at `index`.
    #[must_use]
    pub fn address_at(&self, index: usize) -> Option<Address> {
        self.authorities.get(index).map(|a| a.address())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.authorities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }
}

impl std::fmt::Debug for AuthorityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.authorities.iter().map(|a| a.address()))
            .finish()
    }
}
