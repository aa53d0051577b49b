//! Pure risk status classification

use crate::config::RiskGuardConfig;
use crate::types::RiskStatus;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Drawdown at or above this is at least a warning.
pub const WARNING_DRAWDOWN: Decimal = dec!(0.05);

/// Drawdown at or above this is at least critical.
pub const CRITICAL_DRAWDOWN: Decimal = dec!(0.08);

/// Classify a drawdown against the user's configured limit.
///
/// The emergency branch is checked first: a user whose configured limit sits
/// below the fixed warning/critical thresholds goes straight to emergency
/// once that limit is breached, preempting the lower rungs.
pub fn classify(current_drawdown: Decimal, config: &RiskGuardConfig) -> RiskStatus {
    if current_drawdown >= config.max_drawdown_pct {
        RiskStatus::Emergency
    } else if current_drawdown >= CRITICAL_DRAWDOWN {
        RiskStatus::Critical
    } else if current_drawdown >= WARNING_DRAWDOWN {
        RiskStatus::Warning
    } else {
        RiskStatus::Safe
    }
}
