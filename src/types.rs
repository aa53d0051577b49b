//! Core domain types
//!
//! Closed enums for classification (status, alert type/severity, protective
//! intent) plus the per-user monitoring records. Everything persistable
//! derives serde so the stores can be flattened into snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk status of a portfolio after one evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    Safe,
    Warning,
    Critical,
    Emergency,
}

/// What kind of condition an alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    DrawdownWarning,
    DrawdownCritical,
    LiquidityLow,
    VolatilityHigh,
    PositionConcentration,
}

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
    Emergency,
}

/// A single risk alert. Immutable after creation except for `acknowledged`,
/// which is flipped exactly once by the acknowledge operation. Alerts are
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    /// Globally unique, derived from the owner and creation timestamp
    pub alert_id: String,
    pub user_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

impl RiskAlert {
    /// Create a new unacknowledged alert.
    pub fn new(
        user_id: &str,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: String,
    ) -> Self {
        let timestamp = Utc::now();
        Self {
            alert_id: Self::derive_id(user_id, timestamp),
            user_id: user_id.to_string(),
            alert_type,
            severity,
            message,
            timestamp,
            acknowledged: false,
        }
    }

    /// Alert ids are a pure function of owner and creation time.
    fn derive_id(user_id: &str, timestamp: DateTime<Utc>) -> String {
        let nanos = timestamp
            .timestamp_nanos_opt()
            .unwrap_or_else(|| timestamp.timestamp_micros().saturating_mul(1_000));
        format!("alert_{}_{}", user_id, nanos)
    }
}

/// Protective action recommended for a risk status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum ProtectiveIntent {
    /// Surface the condition to the user, take no market action
    NotifyOnly,
    /// Reduce exposure by the given fraction of current positions
    UnwindPartial { fraction: Decimal },
    /// Exit all positions
    UnwindFull,
}

/// Per-user monitoring state. Mutated only by the engine, inside the
/// per-user evaluation guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringState {
    pub user_id: String,
    pub last_check: DateTime<Utc>,
    /// Fractional decline from peak, in [0, 1]
    pub current_drawdown: Decimal,
    /// Highest observed portfolio value; non-decreasing unless explicitly reset
    pub peak_value: Decimal,
    pub current_value: Decimal,
    /// Descriptive label passed through verbatim from the portfolio provider
    pub risk_level: String,
    /// Ids of alerts raised for this user, in emission order
    pub active_alerts: Vec<String>,
    pub monitoring_enabled: bool,
}

impl MonitoringState {
    /// Fresh state seeded at an initial portfolio value (the initial peak).
    pub fn new(user_id: &str, initial_value: Decimal) -> Self {
        Self {
            user_id: user_id.to_string(),
            last_check: Utc::now(),
            current_drawdown: Decimal::ZERO,
            peak_value: initial_value,
            current_value: initial_value,
            risk_level: String::new(),
            active_alerts: Vec::new(),
            monitoring_enabled: true,
        }
    }

    /// Fold one observed portfolio value into the state: ratchet the peak,
    /// recompute drawdown, stamp the check time. Returns the new drawdown.
    pub fn record_observation(
        &mut self,
        value: Decimal,
        risk_level: &str,
        now: DateTime<Utc>,
    ) -> Decimal {
        self.peak_value = self.peak_value.max(value);
        self.current_value = value;
        self.current_drawdown = drawdown(self.peak_value, value);
        self.risk_level = risk_level.to_string();
        self.last_check = now;
        self.current_drawdown
    }
}

/// Fractional decline from peak: `(peak - current) / peak`, clamped at zero.
/// A zero peak means nothing has been observed yet, so drawdown is zero.
pub fn drawdown(peak: Decimal, current: Decimal) -> Decimal {
    if peak <= Decimal::ZERO || current >= peak {
        return Decimal::ZERO;
    }
    (peak - current) / peak
}

/// Outcome of one evaluation cycle. Ephemeral: returned to the caller,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringResult {
    pub user_id: String,
    pub status: RiskStatus,
    pub current_drawdown: Decimal,
    pub peak_value: Decimal,
    pub current_value: Decimal,
    /// Alerts generated in this cycle only
    pub alerts: Vec<RiskAlert>,
    pub recommended_actions: Vec<ProtectiveIntent>,
    pub next_check_time: DateTime<Utc>,
}

/// Aggregate view across all monitored users.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStats {
    pub monitored_users: usize,
    /// Unacknowledged alerts across all users
    pub active_alerts: usize,
    /// Users whose stored drawdown exceeds the warning threshold
    pub users_at_risk: usize,
    pub timestamp: DateTime<Utc>,
}

/// Per-user risk summary recomputed from stored state and config.
#[derive(Debug, Clone, Serialize)]
pub struct UserRiskSummary {
    pub user_id: String,
    pub status: RiskStatus,
    pub current_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub active_alert_count: usize,
    pub monitoring_enabled: bool,
}
