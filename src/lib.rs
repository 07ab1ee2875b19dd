//! # fleet-warmer
//!
//! 基于需求预测的无服务器函数预热调度器，在全局并发预算内消除冷启动。
//!
//! Forecast-driven warm-up scheduler for serverless function fleets. It measures
//! recent concurrency per function, forecasts near-future demand and issues
//! warm-up calls that pre-provision enough containers, while the number of
//! simultaneous warm-up calls never exceeds a fleet-wide concurrency budget.
//!
//! ## Overview
//!
//! ```text
//! FleetConfig → MetricsCollector → DemandForecaster → BatchPlanner → WarmupDispatcher
//!                     │
//!              StartupTimeEstimator (settings formatting)
//! ```
//!
//! - **Forecasting**: simple exponential smoothing over the last day of concurrency
//! - **Planning**: deterministic first-fit packing into budget-safe batches
//! - **Dispatch**: every call of a batch runs concurrently; batches run in sequence
//! - **Pluggable collaborators**: configuration, metrics, settings and invocation
//!   are traits with HTTP and in-memory implementations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleet_warmer::config::{ConfigProvider, FileConfigProvider};
//! use fleet_warmer::metrics::HttpMetadataProvider;
//! use fleet_warmer::transport::HttpTransport;
//! use fleet_warmer::{Orchestrator, RunContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> fleet_warmer::Result<()> {
//!     let transport = HttpTransport::new()?;
//!     let metadata = Arc::new(HttpMetadataProvider::from_env(transport.clone())?);
//!     let orchestrator = Orchestrator::new(
//!         RunContext::from_env(),
//!         metadata.clone(),
//!         metadata,
//!         Arc::new(transport),
//!     );
//!
//!     let config = FileConfigProvider::new("fleet.yaml").load().await?;
//!     let report = orchestrator.run(&config).await?;
//!     println!("{} warm-up calls succeeded", report.warm_results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Fleet configuration loading, validation and expansion |
//! | [`metrics`] | Concurrency history and function settings collection |
//! | [`forecast`] | Demand forecasting |
//! | [`startup`] | Cold-start latency estimates |
//! | [`batch`] | Batch planning and concurrent dispatch |
//! | [`client`] | Warm-up invocation client |
//! | [`transport`] | Platform invocation transport |
//! | [`pipeline`] | End-to-end run orchestration |
//! | [`handler`] | Request boundary and response envelope |

pub mod batch;
pub mod client;
pub mod config;
pub mod context;
pub mod forecast;
pub mod handler;
pub mod metrics;
pub mod pipeline;
pub mod response;
pub mod startup;
pub mod transport;

// Re-export main types for convenience
pub use batch::{BatchPlanner, DispatchReport, WarmBatch, WarmupDispatcher};
pub use client::{InvocationClient, InvocationOutcome};
pub use config::{FleetConfig, FunctionTarget, ScalingPolicy};
pub use context::RunContext;
pub use forecast::{DemandForecaster, ForecastResult};
pub use handler::WarmupHandler;
pub use metrics::MetricsCollector;
pub use pipeline::{Orchestrator, PlanReport, RunReport};
pub use response::Envelope;
pub use startup::StartupTimeEstimator;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorKind};
