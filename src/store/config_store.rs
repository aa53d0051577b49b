//! Per-user risk configuration store

use crate::config::RiskGuardConfig;
use crate::error::{Result, RiskError};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Validated per-user drawdown limits.
pub struct RiskConfigStore {
    configs: RwLock<HashMap<String, RiskGuardConfig>>,
}

impl RiskConfigStore {
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert a config. Out-of-range limits are rejected and never stored.
    pub fn set(&self, user_id: &str, config: RiskGuardConfig) -> Result<()> {
        config.validate()?;
        self.configs.write().insert(user_id.to_string(), config);
        Ok(())
    }

    pub fn get(&self, user_id: &str) -> Result<RiskGuardConfig> {
        self.configs
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| RiskError::NotFound(format!("no risk config for user {}", user_id)))
    }

    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }

    /// Flatten to a (user, config) list ordered by user id.
    pub fn export(&self) -> Vec<(String, RiskGuardConfig)> {
        let mut entries: Vec<_> = self
            .configs
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Replace contents from a flattened list.
    pub fn restore(&self, entries: Vec<(String, RiskGuardConfig)>) {
        *self.configs.write() = entries.into_iter().collect();
    }
}

impl Default for RiskConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
