//! Configuration types for the settlement router.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OpenborrowError, Result, constants};

/// Typed-data domain fields shared by every authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Protocol name (e.g., "openBorrow").
    pub name: String,
    /// Protocol version (e.g., "v1.0.0").
    pub version: String,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            name: constants::DOMAIN_NAME.to_string(),
            version: constants::DOMAIN_VERSION.to_string(),
        }
    }
}

/// How much a repayment may exceed the interest owed.
///
/// A repayment below the interest owed is always rejected. Anything above it
/// is accepted and refunded, unless `max_overpayment_bps` caps the excess.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestPolicy {
    /// Maximum accepted overpayment in basis points of the interest owed.
    #[serde(default)]
    pub max_overpayment_bps: Option<u32>,
}

impl InterestPolicy {
    /// Largest payment accepted for `interest`.
    ///
    /// `None` when no cap is configured, or when the cap exceeds the largest
    /// representable amount and so cannot bind.
    #[must_use]
    pub fn payment_cap(&self, interest: Decimal) -> Option<Decimal> {
        let bps = self.max_overpayment_bps?;
        let ratio = Decimal::from(bps) / Decimal::from(constants::BPS_DENOMINATOR);
        interest
            .checked_mul(ratio)
            .and_then(|excess| interest.checked_add(excess))
    }
}

/// Configuration for a single settlement router deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Execution-context identifier bound into every signature domain.
    pub chain_id: u64,
    #[serde(default)]
    pub domain: DomainConfig,
    #[serde(default)]
    pub interest: InterestPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            chain_id: constants::DEFAULT_CHAIN_ID,
            domain: DomainConfig::default(),
            interest: InterestPolicy::default(),
        }
    }
}

impl RouterConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns `Serialization` for malformed JSON and `Configuration` for
    /// values that fail [`RouterConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Configuration` if the domain is empty or the overpayment cap
    /// exceeds 100%.
    pub fn validate(&self) -> Result<()> {
        if self.domain.name.is_empty() || self.domain.version.is_empty() {
            return Err(OpenborrowError::Configuration(
                "domain name and version must be non-empty".into(),
            ));
        }
        if let Some(bps) = self.interest.max_overpayment_bps {
            if bps > constants::BPS_DENOMINATOR {
                return Err(OpenborrowError::Configuration(format!(
                    "max_overpayment_bps {bps} exceeds {}",
                    constants::BPS_DENOMINATOR
                )));
            }
        }
        Ok(())
    }
}
