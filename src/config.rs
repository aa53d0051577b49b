//! Configuration management
//!
//! Two layers of configuration live here:
//! - [`RiskGuardConfig`]: the per-user drawdown limit, validated at write time
//! - [`MonitorSettings`]: process-wide engine settings loaded from file/env

use crate::error::{Result, RiskError};
use crate::risk::AlertPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-user risk guard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskGuardConfig {
    /// Maximum tolerated drawdown as a fraction of peak value (e.g., 0.15 = 15%).
    /// Must lie in (0, 1].
    pub max_drawdown_pct: Decimal,
}

impl RiskGuardConfig {
    pub fn new(max_drawdown_pct: Decimal) -> Self {
        Self { max_drawdown_pct }
    }

    /// Reject limits outside (0, 1]. Out-of-range values are never stored.
    pub fn validate(&self) -> Result<()> {
        if self.max_drawdown_pct <= Decimal::ZERO || self.max_drawdown_pct > Decimal::ONE {
            return Err(RiskError::InvalidInput(format!(
                "max_drawdown_pct must be in (0, 1], got {}",
                self.max_drawdown_pct
            )));
        }
        Ok(())
    }
}

impl Default for RiskGuardConfig {
    fn default() -> Self {
        Self {
            max_drawdown_pct: dec!(0.15), // 15%
        }
    }
}

/// Process-wide monitoring settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Interval between scheduled evaluations in seconds
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// How repeat alerts for an ongoing condition are handled
    #[serde(default)]
    pub alert_policy: AlertPolicy,
}

fn default_check_interval() -> u64 {
    30
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval(),
            alert_policy: AlertPolicy::default(),
        }
    }
}

impl MonitorSettings {
    /// Load settings from file with RISKGUARD_* environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_str().ok_or_else(|| {
            anyhow::anyhow!("config path is not valid UTF-8")
        })?;
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("RISKGUARD"))
            .build()?;

        let settings: MonitorSettings = settings.try_deserialize()?;
        Ok(settings)
    }

    /// Load from default locations, falling back to defaults when no file exists.
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["riskguard.toml", "~/.config/riskguard/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        Ok(Self::default())
    }
}
