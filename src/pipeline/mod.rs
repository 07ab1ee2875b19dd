//! 预热流水线：配置展开、指标采集、需求预测、批次规划与分批调度。
//!
//! # Warm-up Pipeline
//!
//! The [`Orchestrator`] drives one warm-up run through a fixed, linear sequence of
//! stages:
//!
//! ```text
//! Configured → MetricsCollected → Forecasted → Planned → Dispatching → Done
//!     │               │                │           │            │
//!  targets      samples and       forecast per  first-fit   batches run
//!  expanded     settings per      target        batches     one by one
//!               target
//! ```
//!
//! Any failure before dispatch aborts the run. During dispatch, failed calls are
//! logged and left out of the result; they never abort the run.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Orchestrator`] | Runs the stages above |
//! | [`PipelineStage`] | Stage markers, logged on every transition |
//! | [`RunReport`] | Successful outcomes and counters of a full run |
//! | [`PlanReport`] | Batches of a dry run, nothing invoked |


use crate::batch::{BatchPlanner, WarmBatch, WarmupDispatcher};
use crate::client::{
    InvocationClient, InvocationOutcome, PayloadBuilder, ResultFilter, SuccessStatus, WarmUpPayload,
};
use crate::config::{FleetConfig, FunctionTarget};
use crate::context::RunContext;
use crate::forecast::{DemandForecaster, ForecastResult};
use crate::metrics::{MetricsCollector, MetricsProvider, SettingsProvider};
use crate::transport::InvocationTransport;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Configured,
    MetricsCollected,
    Forecasted,
    Planned,
    Dispatching,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Configured => "configured",
            PipelineStage::MetricsCollected => "metrics_collected",
            PipelineStage::Forecasted => "forecasted",
            PipelineStage::Planned => "planned",
            PipelineStage::Dispatching => "dispatching",
            PipelineStage::Done => "done",
        }
    }

    /// The only stage that may follow this one.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Configured => Some(PipelineStage::MetricsCollected),
            PipelineStage::MetricsCollected => Some(PipelineStage::Forecasted),
            PipelineStage::Forecasted => Some(PipelineStage::Planned),
            PipelineStage::Planned => Some(PipelineStage::Dispatching),
            PipelineStage::Dispatching => Some(PipelineStage::Done),
            PipelineStage::Done => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the stage of one run and logs each transition with the run id.
struct StageTracker<'a> {
    run_id: &'a str,
    stage: PipelineStage,
}

impl<'a> StageTracker<'a> {
    fn start(run_id: &'a str, stage_name: &str, targets: usize) -> Self {
        info!(
            run_id,
            stage = PipelineStage::Configured.as_str(),
            deployment_stage = stage_name,
            targets,
            "warm-up run started"
        );
        Self {
            run_id,
            stage: PipelineStage::Configured,
        }
    }

    fn advance(&mut self) -> PipelineStage {
        if let Some(next) = self.stage.next() {
            info!(
                run_id = self.run_id,
                from = self.stage.as_str(),
                stage = next.as_str(),
                "pipeline stage"
            );
            self.stage = next;
        }
        self.stage
    }
}

/// Outcome of a full warm-up run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    /// Successful calls only, flattened across batches in dispatch order.
    pub warm_results: Vec<InvocationOutcome>,
    pub batches: usize,
    pub total_calls: usize,
    pub failed_calls: usize,
    #[serde(skip)]
    pub execution_time: Duration,
}

/// Outcome of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub run_id: String,
    pub global_max_concurrency: u32,
    pub batches: Vec<WarmBatch>,
}

impl PlanReport {
    pub fn total_calls(&self) -> u64 {
        self.batches.iter().map(|b| u64::from(b.sum())).sum()
    }
}

pub struct Orchestrator<P = WarmUpPayload, F = SuccessStatus> {
    context: RunContext,
    collector: MetricsCollector,
    forecaster: DemandForecaster,
    dispatcher: WarmupDispatcher<P, F>,
}

impl Orchestrator {
    pub fn new(
        context: RunContext,
        metrics: Arc<dyn MetricsProvider>,
        settings: Arc<dyn SettingsProvider>,
        transport: Arc<dyn InvocationTransport>,
    ) -> Self {
        let collector =
            MetricsCollector::new(metrics, settings).with_query(context.metrics_query);
        let dispatcher = WarmupDispatcher::new(InvocationClient::new(transport));
        Self::with_parts(context, collector, dispatcher)
    }
}

impl<P: PayloadBuilder, F: ResultFilter> Orchestrator<P, F> {
    pub fn with_parts(
        context: RunContext,
        collector: MetricsCollector,
        dispatcher: WarmupDispatcher<P, F>,
    ) -> Self {
        let forecaster = DemandForecaster::new(context.smoothing_level);
        Self {
            context,
            collector,
            forecaster,
            dispatcher,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Collect, forecast and plan without invoking anything.
    pub async fn plan_only(&self, config: &FleetConfig) -> Result<PlanReport> {
        let run_id = Uuid::new_v4().to_string();
        let (batches, _) = self.prepare(config, &run_id).await?;
        info!(run_id = run_id.as_str(), batches = batches.len(), "dry run planned");
        Ok(PlanReport {
            run_id,
            global_max_concurrency: config.max_concurrency(),
            batches,
        })
    }

    /// Full run: batches are dispatched one after another.
    pub async fn run(&self, config: &FleetConfig) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let (batches, mut tracker) = self.prepare(config, &run_id).await?;

        tracker.advance();
        let mut warm_results = Vec::new();
        let mut total_calls = 0;
        let mut failed_calls = 0;
        for (index, batch) in batches.iter().enumerate() {
            info!(
                run_id = run_id.as_str(),
                batch = index + 1,
                of = batches.len(),
                functions = ?batch.names(),
                sum = batch.sum(),
                "dispatching batch"
            );
            let report = self.dispatcher.dispatch(batch).await;
            total_calls += report.total();
            failed_calls += report.failure_count();
            warm_results.extend(report.into_successes());
        }
        tracker.advance();

        let report = RunReport {
            run_id: run_id.clone(),
            warm_results,
            batches: batches.len(),
            total_calls,
            failed_calls,
            execution_time: start.elapsed(),
        };
        info!(
            run_id = run_id.as_str(),
            batches = report.batches,
            calls = report.total_calls,
            failed = report.failed_calls,
            elapsed_ms = report.execution_time.as_millis() as u64,
            "warm-up run finished"
        );
        Ok(report)
    }

    /// Stages `Configured` through `Planned`.
    async fn prepare<'a>(
        &self,
        config: &FleetConfig,
        run_id: &'a str,
    ) -> Result<(Vec<WarmBatch>, StageTracker<'a>)> {
        let targets = config.targets()?;
        let planner = BatchPlanner::new(config.max_concurrency())?;
        let mut tracker = StageTracker::start(run_id, &self.context.stage, targets.len());

        let collected = self.collector.collect_all(targets).await?;
        tracker.advance();

        let forecasts = collected
            .into_iter()
            .map(|c| {
                let forecast = self.forecast_target(&c.target, &c.history())?;
                Ok((c.target, forecast))
            })
            .collect::<Result<Vec<_>>>()?;
        tracker.advance();

        let batches = planner.plan(&forecasts)?;
        tracker.advance();
        Ok((batches, tracker))
    }

    fn forecast_target(&self, target: &FunctionTarget, history: &[f64]) -> Result<ForecastResult> {
        self.forecaster
            .forecast(history, self.context.forecast_horizon)
            .map_err(|e| {
                let context = e
                    .context()
                    .cloned()
                    .unwrap_or_default()
                    .with_target(target.name.clone());
                e.with_context(context)
            })
    }
}
