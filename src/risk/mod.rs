//! Risk classification and response
//!
//! - Pure status classification from drawdown and per-user limits
//! - Protective action recommendation per status
//! - Alert generation with a pluggable repeat-alert policy

mod actions;
mod alerts;
mod evaluator;

pub use actions::recommend_actions;
pub use alerts::{AlertGenerator, AlertPolicy};
pub use evaluator::{classify, WARNING_DRAWDOWN};
