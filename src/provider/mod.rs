//! Portfolio data provider seam
//!
//! The engine never computes portfolio valuation itself; it asks an external
//! provider for the current total. The trait keeps the engine testable and
//! the valuation pipeline out of this crate. Provider failures are opaque
//! upstream errors; the engine wraps them into its own taxonomy.

pub mod mock;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use mock::MockPortfolioProvider;

/// One position inside a portfolio snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    pub symbol: String,
    pub quantity: Decimal,
    pub market_value: Decimal,
}

/// Point-in-time portfolio snapshot returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub total_value: Decimal,
    pub positions: Vec<PortfolioPosition>,
    /// Provider's own descriptive risk label, passed through verbatim
    pub risk_level: String,
}

impl PortfolioSnapshot {
    /// Snapshot with a bare total and no position detail.
    pub fn with_total(total_value: Decimal) -> Self {
        Self {
            total_value,
            positions: Vec::new(),
            risk_level: "normal".to_string(),
        }
    }
}

/// Asynchronous source of portfolio snapshots (allows mocking).
#[async_trait]
pub trait PortfolioProvider: Send + Sync {
    async fn get_portfolio(&self, user_id: &str) -> anyhow::Result<PortfolioSnapshot>;
}
