//! Alert store with acknowledgment lifecycle
//!
//! Alerts are append-only: once created they are never deleted, only
//! acknowledged (by their owner).

use crate::error::{Result, RiskError};
use crate::types::RiskAlert;
use parking_lot::RwLock;
use std::collections::HashMap;

pub struct AlertStore {
    alerts: RwLock<HashMap<String, RiskAlert>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, alert: RiskAlert) {
        self.alerts.write().insert(alert.alert_id.clone(), alert);
    }

    pub fn get(&self, alert_id: &str) -> Result<RiskAlert> {
        self.alerts
            .read()
            .get(alert_id)
            .cloned()
            .ok_or_else(|| RiskError::NotFound(format!("no alert {}", alert_id)))
    }

    /// Flip `acknowledged` on an alert owned by `user_id`.
    ///
    /// `NotFound` if the alert does not exist; `Unauthorized` (alert
    /// unchanged) if the caller is not the owner.
    pub fn acknowledge(&self, alert_id: &str, user_id: &str) -> Result<()> {
        let mut alerts = self.alerts.write();
        let alert = alerts
            .get_mut(alert_id)
            .ok_or_else(|| RiskError::NotFound(format!("no alert {}", alert_id)))?;

        if alert.user_id != user_id {
            return Err(RiskError::Unauthorized(format!(
                "alert {} does not belong to user {}",
                alert_id, user_id
            )));
        }

        alert.acknowledged = true;
        Ok(())
    }

    /// All unacknowledged alerts for a user. Order not guaranteed.
    pub fn active_for(&self, user_id: &str) -> Vec<RiskAlert> {
        self.alerts
            .read()
            .values()
            .filter(|a| a.user_id == user_id && !a.acknowledged)
            .cloned()
            .collect()
    }

    /// Unacknowledged alerts across all users.
    pub fn total_active(&self) -> usize {
        self.alerts
            .read()
            .values()
            .filter(|a| !a.acknowledged)
            .count()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }

    /// Flatten to an (alert id, alert) list ordered by id.
    pub fn export(&self) -> Vec<(String, RiskAlert)> {
        let mut entries: Vec<_> = self
            .alerts
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Replace contents from a flattened list.
    pub fn restore(&self, entries: Vec<(String, RiskAlert)>) {
        *self.alerts.write() = entries.into_iter().collect();
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
