//! Engine configuration.
//!
//! Values that have a valid range are `nutype` wrappers, so an
//! `EngineConfig` that exists is always usable.

use std::time::Duration;

use nutype::nutype;
use serde::{Deserialize, Serialize};

/// Maximum number of attempts made to release one reservation.
///
/// Validated to be between 1 and 10 attempts so a persistently failing store
/// cannot stall a request indefinitely.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 10),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Display,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct MaxReleaseAttempts(u32);

/// How a compensating release is retried before it is reported as an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationRetry {
    /// Attempts per reserved line, including the first one.
    pub max_attempts: MaxReleaseAttempts,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl CompensationRetry {
    /// Release exactly once and never wait.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: MaxReleaseAttempts::try_new(1).expect("1 is a valid attempt count"),
            backoff: Duration::ZERO,
        }
    }
}

impl Default for CompensationRetry {
    fn default() -> Self {
        Self {
            max_attempts: MaxReleaseAttempts::try_new(3).expect("3 is a valid attempt count"),
            backoff: Duration::from_millis(10),
        }
    }
}

/// Whether placed orders carry a copy of the buyer's shipping address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingPolicy {
    /// Never read billing details.
    Skip,
    /// Copy the address when the buyer has one on file.
    #[default]
    SnapshotIfAvailable,
    /// Refuse to place an order for a buyer without billing details.
    Require,
}

/// Configuration for [`OrderPlacementEngine`](crate::OrderPlacementEngine).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Shipping snapshot behaviour (default: snapshot if available)
    pub shipping: ShippingPolicy,
    /// Release retry behaviour (default: 3 attempts, 10ms apart)
    pub compensation: CompensationRetry,
}

impl EngineConfig {
    /// Replace the shipping policy.
    #[must_use]
    pub fn with_shipping(mut self, shipping: ShippingPolicy) -> Self {
        self.shipping = shipping;
        self
    }

    /// Replace the compensation retry settings.
    #[must_use]
    pub fn with_compensation(mut self, compensation: CompensationRetry) -> Self {
        self.compensation = compensation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_outside_range_are_rejected() {
        assert!(MaxReleaseAttempts::try_new(0).is_err());
        assert!(MaxReleaseAttempts::try_new(11).is_err());
        assert!(MaxReleaseAttempts::try_new(10).is_ok());
    }

    #[test]
    fn defaults_snapshot_shipping_and_retry_three_times() {
        let config = EngineConfig::default();

        assert_eq!(config.shipping, ShippingPolicy::SnapshotIfAvailable);
        assert_eq!(config.compensation.max_attempts.into_inner(), 3);
    }

    #[test]
    fn builders_replace_individual_settings() {
        let config = EngineConfig::default()
            .with_shipping(ShippingPolicy::Require)
            .with_compensation(CompensationRetry::no_retry());

        assert_eq!(config.shipping, ShippingPolicy::Require);
        assert_eq!(config.compensation.backoff, Duration::ZERO);
    }
}
