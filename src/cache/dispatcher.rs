use std::{collections::VecDeque, sync::Arc};

use anyhow::Result;

use crate::{cache::CacheInvalidator, domain::TenantContext};

/// Signal meaning "invalidate every cache entry of the active tenant"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushAllCaches;

/// Synchronous dispatch of flush signals to registered invalidators
#[derive(Default)]
pub struct EventDispatcher {
    invalidators: Vec<Arc<dyn CacheInvalidator>>,
    pending: VecDeque<FlushAllCaches>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invalidator. Invalidators run in registration order.
    pub fn register(&mut self, invalidator: Arc<dyn CacheInvalidator>) {
        self.invalidators.push(invalidator);
    }

    pub fn invalidator_count(&self) -> usize {
        self.invalidators.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a signal until the next `dispatch`
    pub fn notify(&mut self, signal: FlushAllCaches) {
        self.pending.push_back(signal);
    }

    /// Hand every queued signal to every invalidator, stopping at the first failure.
    ///
    /// The queue is drained before delivery, so a failed delivery discards its signals.
    pub async fn dispatch(&mut self, context: &TenantContext) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        for signal in pending {
            for invalidator in &self.invalidators {
                tracing::debug!(
                    invalidator = invalidator.name(),
                    tenant = %context.tenant(),
                    "Dispatching flush signal"
                );
                invalidator.flush_all(&signal, context).await?;
            }
        }

        Ok(())
    }
}
