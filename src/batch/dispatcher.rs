//! Batch dispatcher.

use super::planner::WarmBatch;
use crate::client::{
    InvocationClient, InvocationOutcome, PayloadBuilder, ResultFilter, SuccessStatus, WarmUpPayload,
};
use futures::future::join_all;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// One entry per warm-up call, in dispatch order.
    pub outcomes: Vec<InvocationOutcome>,
    pub execution_time: Duration,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total() - self.success_count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.success_count() as f64 / self.total() as f64
        }
    }

    pub fn into_successes(self) -> Vec<InvocationOutcome> {
        self.outcomes.into_iter().filter(|o| o.success).collect()
    }
}

/// Fires `warm_count` calls per entry of a batch, all at once, and waits for every one.
pub struct WarmupDispatcher<P = WarmUpPayload, F = SuccessStatus> {
    client: InvocationClient<P, F>,
}

impl<P: PayloadBuilder, F: ResultFilter> WarmupDispatcher<P, F> {
    pub fn new(client: InvocationClient<P, F>) -> Self {
        Self { client }
    }

    pub async fn dispatch(&self, batch: &WarmBatch) -> DispatchReport {
        let start = Instant::now();
        let calls = batch.entries().iter().flat_map(|entry| {
            std::iter::repeat(&entry.target)
                .take(entry.warm_count as usize)
                .map(|target| self.client.call(target))
        });
        let outcomes = join_all(calls).await;

        for failed in outcomes.iter().filter(|o| !o.success) {
            warn!(
                function = failed.target.as_str(),
                region = failed.region.as_str(),
                error = failed.error.as_deref().unwrap_or("unknown"),
                "warm-up call failed"
            );
        }

        let report = DispatchReport {
            outcomes,
            execution_time: start.elapsed(),
        };
        info!(
            functions = batch.len(),
            calls = report.total(),
            failed = report.failure_count(),
            elapsed_ms = report.execution_time.as_millis() as u64,
            "batch dispatched"
        );
        report
    }
}
