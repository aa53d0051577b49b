//! Checkpoint/restart snapshot format
//!
//! Each store flattens to an ordered (key, value) list inside a single
//! versioned document. Rehydration is deliberately lenient: a malformed
//! store section (or an unknown schema version) resets the affected
//! store(s) to empty rather than halting the process.

use crate::config::RiskGuardConfig;
use crate::error::{Result, RiskError};
use crate::types::{MonitoringState, RiskAlert};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Flattened contents of all three stores.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub schema_version: u32,
    pub configs: Vec<(String, RiskGuardConfig)>,
    pub states: Vec<(String, MonitoringState)>,
    pub alerts: Vec<(String, RiskAlert)>,
}

/// Decode-side view: sections stay opaque so one corrupt section cannot
/// poison the others.
#[derive(Deserialize)]
struct RawSnapshot {
    schema_version: u32,
    #[serde(default)]
    configs: serde_json::Value,
    #[serde(default)]
    states: serde_json::Value,
    #[serde(default)]
    alerts: serde_json::Value,
}

impl EngineSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            configs: Vec::new(),
            states: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RiskError::Internal(format!("snapshot encode failed: {}", e)))
    }

    /// Rehydrate from a persisted document. Never fails: an unreadable
    /// document or unknown schema version yields an empty snapshot, and a
    /// corrupt store section yields an empty list for that store only.
    pub fn from_json(raw: &str) -> Self {
        let doc: RawSnapshot = match serde_json::from_str(raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable snapshot, starting from empty stores");
                return Self::empty();
            }
        };

        if doc.schema_version != SNAPSHOT_SCHEMA_VERSION {
            tracing::warn!(
                found = doc.schema_version,
                expected = SNAPSHOT_SCHEMA_VERSION,
                "unknown snapshot schema version, starting from empty stores"
            );
            return Self::empty();
        }

        Self {
            schema_version: doc.schema_version,
            configs: decode_section("configs", doc.configs),
            states: decode_section("states", doc.states),
            alerts: decode_section("alerts", doc.alerts),
        }
    }
}

fn decode_section<T: DeserializeOwned>(name: &str, value: serde_json::Value) -> Vec<(String, T)> {
    match serde_json::from_value(value) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(section = name, error = %e, "corrupt snapshot section, resetting store");
            Vec::new()
        }
    }
}
