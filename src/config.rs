use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::IdlePolicy;

/// Default per-instance idle threshold for templated pools.
pub const DEFAULT_ITEM_IDLE: Duration = Duration::from_secs(120);

/// Default empty-pool threshold for templated pools.
pub const DEFAULT_POOL_IDLE: Duration = Duration::from_secs(120);

/// Default per-instance idle threshold for the plain-value pool.
pub const DEFAULT_COMMON_ITEM_IDLE: Duration = Duration::from_secs(30);

/// Default empty-pool threshold for the plain-value pool.
pub const DEFAULT_COMMON_POOL_IDLE: Duration = Duration::from_secs(30);

/// Tuning knobs for a pool registry.
///
/// The thresholds here seed the default [`IdlePolicy`]; per-key overrides
/// are applied at runtime through the registry's setters. `None` disables
/// the corresponding eviction dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Default idle threshold for individual instances.
    pub item_idle: Option<Duration>,

    /// Default threshold for removing an empty sub-pool.
    pub pool_idle: Option<Duration>,

    /// Idle threshold for instances in the plain-value pool.
    pub common_item_idle: Option<Duration>,

    /// Empty-pool threshold for the plain-value pool.
    pub common_pool_idle: Option<Duration>,
}

impl PoolConfig {
    /// Default policy applied to sub-pools without a per-key override.
    pub fn default_policy(&self) -> IdlePolicy {
        IdlePolicy::new(self.item_idle, self.pool_idle)
    }

    /// Default policy for the plain-value pool.
    pub fn common_policy(&self) -> IdlePolicy {
        IdlePolicy::new(self.common_item_idle, self.common_pool_idle)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            item_idle: Some(DEFAULT_ITEM_IDLE),
            pool_idle: Some(DEFAULT_POOL_IDLE),
            common_item_idle: Some(DEFAULT_COMMON_ITEM_IDLE),
            common_pool_idle: Some(DEFAULT_COMMON_POOL_IDLE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.item_idle, Some(DEFAULT_ITEM_IDLE));
        assert_eq!(
            config.common_policy(),
            IdlePolicy::new(
                Some(DEFAULT_COMMON_ITEM_IDLE),
                Some(DEFAULT_COMMON_POOL_IDLE)
            )
        );
    }

    #[test]
    fn test_disabled_thresholds() {
        let config = PoolConfig {
            item_idle: None,
            pool_idle: None,
            ..Default::default()
        };
        assert_eq!(config.default_policy(), IdlePolicy::disabled());
    }
}
