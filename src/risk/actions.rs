//! Protective action recommendation

use crate::types::{ProtectiveIntent, RiskStatus};
use rust_decimal_macros::dec;

/// Map a risk status to recommended protective actions. The intents are
/// handed to an external execution collaborator; nothing here touches
/// positions.
pub fn recommend_actions(status: RiskStatus) -> Vec<ProtectiveIntent> {
    match status {
        RiskStatus::Safe => vec![],
        RiskStatus::Warning => vec![ProtectiveIntent::NotifyOnly],
        RiskStatus::Critical => vec![ProtectiveIntent::UnwindPartial {
            fraction: dec!(0.25),
        }],
        RiskStatus::Emergency => vec![ProtectiveIntent::UnwindFull],
    }
}
