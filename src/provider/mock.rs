//! Mock portfolio provider for testing
//!
//! Serves a scripted sequence of snapshots (or failures) in call order,
//! with optional artificial latency to widen race windows in concurrency
//! tests.

use crate::provider::{PortfolioProvider, PortfolioSnapshot};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::VecDeque;

type ScriptedResponse = Result<PortfolioSnapshot, String>;

/// Scripted provider: each `get_portfolio` call pops the next response.
pub struct MockPortfolioProvider {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    latency_ms: u64,
}

impl MockPortfolioProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            latency_ms: 0,
        }
    }

    /// Script a sequence of totals, each served as a plain snapshot.
    pub fn with_values(values: &[Decimal]) -> Self {
        let provider = Self::new();
        for value in values {
            provider.push_value(*value);
        }
        provider
    }

    /// Add artificial latency before each response.
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn push_value(&self, total_value: Decimal) {
        self.responses
            .lock()
            .push_back(Ok(PortfolioSnapshot::with_total(total_value)));
    }

    pub fn push_snapshot(&self, snapshot: PortfolioSnapshot) {
        self.responses.lock().push_back(Ok(snapshot));
    }

    /// Script an upstream failure with the given message.
    pub fn push_failure(&self, message: &str) {
        self.responses.lock().push_back(Err(message.to_string()));
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

impl Default for MockPortfolioProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PortfolioProvider for MockPortfolioProvider {
    async fn get_portfolio(&self, user_id: &str) -> anyhow::Result<PortfolioSnapshot> {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        let next = self.responses.lock().pop_front();
        match next {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!(
                "no scripted portfolio response for user {}",
                user_id
            )),
        }
    }
}
