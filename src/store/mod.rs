//! In-memory stores
//!
//! Each store wraps its map in a `parking_lot::RwLock` and flattens to an
//! ordered (key, value) list for the snapshot boundary. Cross-store
//! orchestration lives in the engine, not here.

mod alert_store;
mod config_store;
mod snapshot;
mod state_store;

pub use alert_store::AlertStore;
pub use config_store::RiskConfigStore;
pub use snapshot::{EngineSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use state_store::MonitoringStateStore;
