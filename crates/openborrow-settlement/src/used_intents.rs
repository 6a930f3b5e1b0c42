//! Replay guard for signed intents.
//!
//! Each `(signer, order_type, id)` triple can be consumed once, forever.
//! Unlike a bounded settlement cache there is no eviction: a consumed intent
//! stays consumed even after the position it opened is closed.

use std::collections::HashSet;

use openborrow_types::{IntentKey, OpenborrowError, Result};

/// The set of intents already accepted.
#[derive(Debug, Default)]
pub struct UsedIntentSet {
    used: HashSet<IntentKey>,
}

impl UsedIntentSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `key` was already consumed, without consuming it.
    ///
    /// # Errors
    /// Returns [`OpenborrowError::IntentAlreadyUsed`].
    pub fn ensure_unused(&self, key: &IntentKey) -> Result<()> {
        if self.used.contains(key) {
            return Err(OpenborrowError::IntentAlreadyUsed(*key));
        }
        Ok(())
    }

    /// Consume `key`. Fails if it was consumed before.
    ///
    /// # Errors
    /// Returns [`OpenborrowError::IntentAlreadyUsed`].
    pub fn consume(&mut self, key: IntentKey) -> Result<()> {
        if !self.used.insert(key) {
            return Err(OpenborrowError::IntentAlreadyUsed(key));
        }
        tracing::debug!(intent = %key, "Intent consumed");
        Ok(())
    }

    #[must_use]
    pub fn is_used(&self, key: &IntentKey) -> bool {
        self.used.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
