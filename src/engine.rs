//! Monitoring engine
//!
//! Orchestrates one evaluation cycle per call: config lookup, portfolio
//! fetch, peak/drawdown update, status classification, alert emission,
//! action recommendation, state write-back. Also hosts the read-only stats
//! queries and the snapshot/restore boundary.
//!
//! The provider fetch is the only suspension point. A per-user async mutex
//! is taken before the fetch and held through the state write, so two
//! overlapping `evaluate` calls for one user queue instead of interleaving
//! (which would lose peak updates and double-emit alerts).

use crate::config::{MonitorSettings, RiskGuardConfig};
use crate::error::{Result, RiskError};
use crate::provider::PortfolioProvider;
use crate::risk::{classify, recommend_actions, AlertGenerator, WARNING_DRAWDOWN};
use crate::store::{AlertStore, EngineSnapshot, MonitoringStateStore, RiskConfigStore};
use crate::types::{
    MonitoringResult, MonitoringState, MonitoringStats, RiskAlert, UserRiskSummary,
};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

pub struct MonitoringEngine {
    settings: MonitorSettings,
    provider: Arc<dyn PortfolioProvider>,
    configs: RiskConfigStore,
    states: MonitoringStateStore,
    alerts: AlertStore,
    alert_generator: AlertGenerator,
    /// Per-user evaluation guards; the outer lock is only held to look up
    /// or create a guard, never across an await
    evaluation_guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MonitoringEngine {
    pub fn new(settings: MonitorSettings, provider: Arc<dyn PortfolioProvider>) -> Self {
        let alert_generator = AlertGenerator::new(settings.alert_policy);
        Self {
            settings,
            provider,
            configs: RiskConfigStore::new(),
            states: MonitoringStateStore::new(),
            alerts: AlertStore::new(),
            alert_generator,
            evaluation_guards: Mutex::new(HashMap::new()),
        }
    }

    // ==================== Configuration ====================

    /// Upsert a user's risk config and make sure a monitoring state exists
    /// (creating a zeroed, enabled one, or re-enabling an existing one).
    pub fn set_risk_config(&self, user_id: &str, config: RiskGuardConfig) -> Result<bool> {
        self.configs.set(user_id, config)?;
        self.states.ensure_enabled(user_id);
        Ok(true)
    }

    pub fn get_risk_config(&self, user_id: &str) -> Result<RiskGuardConfig> {
        self.configs.get(user_id)
    }

    // ==================== Evaluation ====================

    /// Run one evaluation cycle for a user.
    ///
    /// The provider fetch is the sole await; its failure is surfaced as
    /// `Internal` carrying the upstream message, with no retry here —
    /// the caller owns retry/backoff on its schedule.
    pub async fn evaluate(&self, user_id: &str) -> Result<MonitoringResult> {
        let config = self.configs.get(user_id)?;

        let guard = self.guard_for(user_id);
        let _cycle = guard.lock().await;

        let snapshot = self
            .provider
            .get_portfolio(user_id)
            .await
            .map_err(|e| RiskError::Internal(format!("portfolio provider failed: {}", e)))?;

        // Lazily created state is seeded at the just-fetched value
        let mut state = self
            .states
            .get(user_id)
            .unwrap_or_else(|_| MonitoringState::new(user_id, snapshot.total_value));

        let now = Utc::now();
        let drawdown =
            state.record_observation(snapshot.total_value, &snapshot.risk_level, now);

        let status = classify(drawdown, &config);
        let recommended_actions = recommend_actions(status);

        let mut cycle_alerts: Vec<RiskAlert> = Vec::new();
        if let Some(alert) = self.alert_generator.emit(
            &self.alerts,
            user_id,
            status,
            drawdown,
            config.max_drawdown_pct,
        ) {
            state.active_alerts.push(alert.alert_id.clone());
            cycle_alerts.push(alert);
        }

        let peak_value = state.peak_value;
        let current_value = state.current_value;
        self.states.put(state);

        tracing::debug!(
            user_id,
            ?status,
            %drawdown,
            %peak_value,
            %current_value,
            "evaluation cycle complete"
        );

        Ok(MonitoringResult {
            user_id: user_id.to_string(),
            status,
            current_drawdown: drawdown,
            peak_value,
            current_value,
            alerts: cycle_alerts,
            recommended_actions,
            next_check_time: now + Duration::seconds(self.settings.check_interval_secs as i64),
        })
    }

    fn guard_for(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut guards = self.evaluation_guards.lock();
        guards.entry(user_id.to_string()).or_default().clone()
    }

    // ==================== State & alerts ====================

    pub fn get_monitoring_state(&self, user_id: &str) -> Result<MonitoringState> {
        self.states.get(user_id)
    }

    /// Unacknowledged alerts for a user. Order not guaranteed.
    pub fn get_active_alerts(&self, user_id: &str) -> Result<Vec<RiskAlert>> {
        Ok(self.alerts.active_for(user_id))
    }

    pub fn acknowledge_alert(&self, alert_id: &str, user_id: &str) -> Result<bool> {
        self.alerts.acknowledge(alert_id, user_id)?;
        Ok(true)
    }

    pub fn enable_monitoring(&self, user_id: &str) -> Result<bool> {
        self.states.set_enabled(user_id, true)?;
        Ok(true)
    }

    pub fn disable_monitoring(&self, user_id: &str) -> Result<bool> {
        self.states.set_enabled(user_id, false)?;
        Ok(true)
    }

    // ==================== Stats queries ====================

    pub fn get_monitoring_stats(&self) -> MonitoringStats {
        MonitoringStats {
            monitored_users: self.states.len(),
            active_alerts: self.alerts.total_active(),
            users_at_risk: self.states.count_drawdown_above(WARNING_DRAWDOWN),
            timestamp: Utc::now(),
        }
    }

    /// Recompute a user's status from stored drawdown and config.
    pub fn get_user_risk_summary(&self, user_id: &str) -> Result<UserRiskSummary> {
        let state = self.states.get(user_id)?;
        let config = self.configs.get(user_id)?;

        Ok(UserRiskSummary {
            user_id: user_id.to_string(),
            status: classify(state.current_drawdown, &config),
            current_drawdown: state.current_drawdown,
            max_drawdown_pct: config.max_drawdown_pct,
            active_alert_count: self.alerts.active_for(user_id).len(),
            monitoring_enabled: state.monitoring_enabled,
        })
    }

    // ==================== Snapshot boundary ====================

    /// Flatten all stores. Fully synchronous: no evaluation can be
    /// mid-flight across this call in a single-threaded caller, and the
    /// store locks are never held across an await.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            schema_version: crate::store::SNAPSHOT_SCHEMA_VERSION,
            configs: self.configs.export(),
            states: self.states.export(),
            alerts: self.alerts.export(),
        }
    }

    /// Rehydrate all stores from a snapshot, replacing current contents.
    pub fn restore(&self, snapshot: EngineSnapshot) {
        self.configs.restore(snapshot.configs);
        self.states.restore(snapshot.states);
        self.alerts.restore(snapshot.alerts);
        tracing::info!(
            users = self.states.len(),
            alerts = self.alerts.len(),
            "stores rehydrated from snapshot"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockPortfolioProvider;
    use crate::types::{AlertSeverity, ProtectiveIntent, RiskStatus};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn engine_with(provider: MockPortfolioProvider) -> MonitoringEngine {
        MonitoringEngine::new(MonitorSettings::default(), Arc::new(provider))
    }

    #[tokio::test]
    async fn test_evaluate_requires_config() {
        let engine = engine_with(MockPortfolioProvider::with_values(&[dec!(100)]));

        let err = engine.evaluate("alice").await.unwrap_err();
        assert!(err.is_not_found());
        // Provider never called
        assert_eq!(engine.get_monitoring_stats().monitored_users, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_internal() {
        let provider = MockPortfolioProvider::new();
        provider.push_failure("valuation service down");
        let engine = engine_with(provider);
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.1)))
            .unwrap();

        let err = engine.evaluate("alice").await.unwrap_err();
        assert!(matches!(err, RiskError::Internal(_)));
        assert!(err.to_string().contains("valuation service down"));
    }

    #[tokio::test]
    async fn test_first_evaluation_seeds_peak() {
        let engine = engine_with(MockPortfolioProvider::with_values(&[dec!(100000)]));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.1)))
            .unwrap();

        let result = engine.evaluate("alice").await.unwrap();

        assert_eq!(result.status, RiskStatus::Safe);
        assert_eq!(result.peak_value, dec!(100000));
        assert_eq!(result.current_drawdown, Decimal::ZERO);
        assert!(result.alerts.is_empty());
        assert!(result.next_check_time > Utc::now());
    }

    #[tokio::test]
    async fn test_status_ladder_end_to_end() {
        // Drawdowns land exactly on each rung: 0%, 5%, 8%, 25% (the limit)
        let engine = engine_with(MockPortfolioProvider::with_values(&[
            dec!(100000),
            dec!(95000),
            dec!(92000),
            dec!(75000),
        ]));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.25)))
            .unwrap();

        let expected = [
            (RiskStatus::Safe, vec![]),
            (RiskStatus::Warning, vec![ProtectiveIntent::NotifyOnly]),
            (
                RiskStatus::Critical,
                vec![ProtectiveIntent::UnwindPartial {
                    fraction: dec!(0.25),
                }],
            ),
            (RiskStatus::Emergency, vec![ProtectiveIntent::UnwindFull]),
        ];

        for (status, actions) in expected {
            let result = engine.evaluate("alice").await.unwrap();
            assert_eq!(result.status, status);
            assert_eq!(result.recommended_actions, actions);
            assert_eq!(result.alerts.len(), usize::from(status != RiskStatus::Safe));
        }

        // One alert per non-safe cycle, peak never moved off the high
        let state = engine.get_monitoring_state("alice").unwrap();
        assert_eq!(state.peak_value, dec!(100000));
        assert_eq!(state.current_value, dec!(75000));
        assert_eq!(state.active_alerts.len(), 3);
        assert_eq!(engine.get_active_alerts("alice").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_risk_level_passed_through_verbatim() {
        use crate::provider::{PortfolioPosition, PortfolioSnapshot};

        let provider = MockPortfolioProvider::new();
        provider.push_snapshot(PortfolioSnapshot {
            total_value: dec!(100000),
            positions: vec![PortfolioPosition {
                symbol: "BTC/USDT".to_string(),
                quantity: dec!(1.5),
                market_value: dec!(100000),
            }],
            risk_level: "elevated".to_string(),
        });
        let engine = engine_with(provider);
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.1)))
            .unwrap();

        engine.evaluate("alice").await.unwrap();

        let state = engine.get_monitoring_state("alice").unwrap();
        assert_eq!(state.risk_level, "elevated");
        assert_eq!(state.current_value, dec!(100000));
    }

    #[tokio::test]
    async fn test_peak_is_monotone_across_cycles() {
        let engine = engine_with(MockPortfolioProvider::with_values(&[
            dec!(100),
            dec!(120),
            dec!(90),
            dec!(119),
        ]));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.5)))
            .unwrap();

        let mut last_peak = Decimal::ZERO;
        for _ in 0..4 {
            let result = engine.evaluate("alice").await.unwrap();
            assert!(result.peak_value >= last_peak);
            last_peak = result.peak_value;
        }
        assert_eq!(last_peak, dec!(120));
    }

    #[tokio::test]
    async fn test_set_risk_config_creates_and_reenables_state() {
        let engine = engine_with(MockPortfolioProvider::new());

        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.1)))
            .unwrap();
        let state = engine.get_monitoring_state("alice").unwrap();
        assert!(state.monitoring_enabled);
        assert_eq!(state.peak_value, Decimal::ZERO);

        engine.disable_monitoring("alice").unwrap();
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.2)))
            .unwrap();
        assert!(engine.get_monitoring_state("alice").unwrap().monitoring_enabled);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_without_side_effects() {
        let engine = engine_with(MockPortfolioProvider::new());

        let err = engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(1.5)))
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
        assert!(engine.get_risk_config("alice").unwrap_err().is_not_found());
        assert!(engine.get_monitoring_state("alice").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_toggles_require_state() {
        let engine = engine_with(MockPortfolioProvider::new());
        assert!(engine.enable_monitoring("ghost").unwrap_err().is_not_found());
        assert!(engine.disable_monitoring("ghost").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_acknowledge_cross_user_rejected() {
        let engine = engine_with(MockPortfolioProvider::with_values(&[
            dec!(100000),
            dec!(90000),
        ]));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.08)))
            .unwrap();

        engine.evaluate("alice").await.unwrap();
        let result = engine.evaluate("alice").await.unwrap();
        let alert_id = result.alerts[0].alert_id.clone();

        let err = engine.acknowledge_alert(&alert_id, "mallory").unwrap_err();
        assert!(matches!(err, RiskError::Unauthorized(_)));
        assert_eq!(engine.get_active_alerts("alice").unwrap().len(), 1);

        assert!(engine.acknowledge_alert(&alert_id, "alice").unwrap());
        assert!(engine.get_active_alerts("alice").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_monitoring_stats() {
        let provider = MockPortfolioProvider::new();
        // alice: peak 100k then 90k (10% drawdown); bob: flat
        provider.push_value(dec!(100000));
        provider.push_value(dec!(50000));
        provider.push_value(dec!(90000));
        let engine = engine_with(provider);

        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.5)))
            .unwrap();
        engine
            .set_risk_config("bob", RiskGuardConfig::new(dec!(0.5)))
            .unwrap();

        engine.evaluate("alice").await.unwrap();
        engine.evaluate("bob").await.unwrap();
        engine.evaluate("alice").await.unwrap();

        let stats = engine.get_monitoring_stats();
        assert_eq!(stats.monitored_users, 2);
        assert_eq!(stats.users_at_risk, 1); // alice at 10% > 5% warning line
        assert_eq!(stats.active_alerts, 1); // alice's critical cycle
    }

    #[tokio::test]
    async fn test_user_risk_summary() {
        let engine = engine_with(MockPortfolioProvider::with_values(&[
            dec!(100000),
            dec!(91000),
        ]));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.10)))
            .unwrap();

        engine.evaluate("alice").await.unwrap();
        engine.evaluate("alice").await.unwrap();

        let summary = engine.get_user_risk_summary("alice").unwrap();
        assert_eq!(summary.current_drawdown, dec!(0.09));
        // 9% against a 10% limit recomputes to critical, not emergency
        assert_eq!(summary.status, RiskStatus::Critical);
        assert_eq!(summary.active_alert_count, 1);
        assert!(summary.monitoring_enabled);

        assert!(engine
            .get_user_risk_summary("ghost")
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_overlapping_evaluations_serialize() {
        let provider =
            MockPortfolioProvider::with_values(&[dec!(100000), dec!(90000)]).with_latency(50);
        let engine = Arc::new(engine_with(provider));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.08)))
            .unwrap();

        // Both calls overlap inside the provider fetch window. Without the
        // per-user guard each would seed its own state and the later write
        // would win, losing the 100000 peak.
        let first = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.evaluate("alice").await })
        };
        let second = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.evaluate("alice").await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let state = engine.get_monitoring_state("alice").unwrap();
        assert_eq!(state.peak_value, dec!(100000));
        assert_eq!(state.current_drawdown, dec!(0.10));
        // One real risk event, one alert
        assert_eq!(engine.get_active_alerts("alice").unwrap().len(), 1);
        let alert = &engine.get_active_alerts("alice").unwrap()[0];
        assert_eq!(alert.severity, AlertSeverity::Emergency);
    }

    #[tokio::test]
    async fn test_snapshot_restore_round_trip() {
        let engine = engine_with(MockPortfolioProvider::with_values(&[
            dec!(100000),
            dec!(90000),
        ]));
        engine
            .set_risk_config("alice", RiskGuardConfig::new(dec!(0.08)))
            .unwrap();
        engine.evaluate("alice").await.unwrap();
        engine.evaluate("alice").await.unwrap();

        let json = engine.snapshot().to_json().unwrap();

        let restored = engine_with(MockPortfolioProvider::new());
        restored.restore(EngineSnapshot::from_json(&json));

        assert_eq!(
            restored.get_risk_config("alice").unwrap(),
            engine.get_risk_config("alice").unwrap()
        );
        assert_eq!(
            restored.get_monitoring_state("alice").unwrap(),
            engine.get_monitoring_state("alice").unwrap()
        );

        let mut before = engine.get_active_alerts("alice").unwrap();
        let mut after = restored.get_active_alerts("alice").unwrap();
        before.sort_by(|a, b| a.alert_id.cmp(&b.alert_id));
        after.sort_by(|a, b| a.alert_id.cmp(&b.alert_id));
        assert_eq!(before, after);
    }
}
