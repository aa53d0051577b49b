//! Per-user monitoring state store

use crate::error::{Result, RiskError};
use crate::types::MonitoringState;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Ratchet state per monitored user (peak/current value, drawdown,
/// enabled flag).
pub struct MonitoringStateStore {
    states: RwLock<HashMap<String, MonitoringState>>,
}

impl MonitoringStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: &str) -> Result<MonitoringState> {
        self.states
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| {
                RiskError::NotFound(format!("no monitoring state for user {}", user_id))
            })
    }

    pub fn put(&self, state: MonitoringState) {
        self.states.write().insert(state.user_id.clone(), state);
    }

    /// Create a zeroed, enabled state if the user has none; re-enable
    /// monitoring if one already exists.
    pub fn ensure_enabled(&self, user_id: &str) {
        let mut states = self.states.write();
        states
            .entry(user_id.to_string())
            .and_modify(|s| s.monitoring_enabled = true)
            .or_insert_with(|| MonitoringState::new(user_id, Decimal::ZERO));
    }

    /// Flip the monitoring flag. `NotFound` without existing state.
    pub fn set_enabled(&self, user_id: &str, enabled: bool) -> Result<()> {
        let mut states = self.states.write();
        match states.get_mut(user_id) {
            Some(state) => {
                state.monitoring_enabled = enabled;
                Ok(())
            }
            None => Err(RiskError::NotFound(format!(
                "no monitoring state for user {}",
                user_id
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }

    /// Users whose stored drawdown strictly exceeds the given threshold.
    pub fn count_drawdown_above(&self, threshold: Decimal) -> usize {
        self.states
            .read()
            .values()
            .filter(|s| s.current_drawdown > threshold)
            .count()
    }

    /// Flatten to a (user, state) list ordered by user id.
    pub fn export(&self) -> Vec<(String, MonitoringState)> {
        let mut entries: Vec<_> = self
            .states
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Replace contents from a flattened list.
    pub fn restore(&self, entries: Vec<(String, MonitoringState)>) {
        *self.states.write() = entries.into_iter().collect();
    }
}

impl Default for MonitoringStateStore {
    fn default() -> Self {
        Self::new()
    }
}
