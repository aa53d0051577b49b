//! Per-User Portfolio Risk Monitor
//!
//! Tracks peak portfolio value per user, computes drawdown, classifies risk
//! severity, emits alerts, and recommends protective actions. Portfolio
//! valuation itself is external: the engine consumes totals through the
//! [`provider::PortfolioProvider`] trait.

pub mod config;
pub mod engine;
pub mod error;
pub mod provider;
pub mod risk;
pub mod store;
pub mod types;

pub use config::{MonitorSettings, RiskGuardConfig};
pub use engine::MonitoringEngine;
pub use error::{Result, RiskError};
pub use provider::{PortfolioProvider, PortfolioSnapshot};
pub use types::{
    AlertSeverity, AlertType, MonitoringResult, MonitoringState, MonitoringStats,
    ProtectiveIntent, RiskAlert, RiskStatus, UserRiskSummary,
};
