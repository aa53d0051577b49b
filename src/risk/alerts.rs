//! Alert generation
//!
//! Builds alert records from evaluator output and writes them into the
//! alert store. Repeat-alert handling sits behind [`AlertPolicy`] so the
//! default per-cycle behavior can be tightened without touching the engine.

use crate::store::AlertStore;
use crate::types::{AlertSeverity, AlertType, RiskAlert, RiskStatus};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Policy for alerts raised on consecutive non-safe cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// One alert per non-safe evaluation cycle, even for an ongoing
    /// condition. Matches the historical behavior of this monitor.
    #[default]
    EveryCycle,
    /// Skip emission while an unacknowledged alert with the same type and
    /// severity already exists for the user.
    DedupByTypeAndSeverity,
}

/// Builds and stores at most one alert per evaluation cycle.
pub struct AlertGenerator {
    policy: AlertPolicy,
}

impl AlertGenerator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    /// Emit an alert for a non-safe status, subject to the repeat policy.
    /// Safe cycles never alert. Returns the stored alert, if any.
    pub fn emit(
        &self,
        store: &AlertStore,
        user_id: &str,
        status: RiskStatus,
        current_drawdown: Decimal,
        max_drawdown_pct: Decimal,
    ) -> Option<RiskAlert> {
        let (alert_type, severity) = match status {
            RiskStatus::Safe => return None,
            RiskStatus::Warning => (AlertType::DrawdownWarning, AlertSeverity::Warning),
            RiskStatus::Critical => (AlertType::DrawdownCritical, AlertSeverity::Critical),
            RiskStatus::Emergency => (AlertType::DrawdownCritical, AlertSeverity::Emergency),
        };

        if self.policy == AlertPolicy::DedupByTypeAndSeverity {
            let already_open = store
                .active_for(user_id)
                .iter()
                .any(|a| a.alert_type == alert_type && a.severity == severity);
            if already_open {
                tracing::debug!(user_id, ?alert_type, ?severity, "suppressing repeat alert");
                return None;
            }
        }

        let message = format!(
            "Drawdown {:.2}% of peak (configured limit {:.2}%)",
            current_drawdown * dec!(100),
            max_drawdown_pct * dec!(100),
        );

        let alert = RiskAlert::new(user_id, alert_type, severity, message);
        tracing::info!(user_id, alert_id = %alert.alert_id, ?severity, "risk alert raised");
        store.insert(alert.clone());
        Some(alert)
    }
}
