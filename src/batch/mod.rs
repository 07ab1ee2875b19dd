//! 预热批处理模块：在并发预算内规划并执行预热调用批次。
//!
//! # Warm-up Batching Module
//!
//! Warm-up calls are grouped into batches whose combined warm count never exceeds
//! the fleet-wide concurrency budget. Batches run one after another; the calls
//! inside a batch run concurrently.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchPlanner`] | First-fit packing of forecasts into budget-safe batches |
//! | [`WarmBatch`] | A batch of `(target, warm count)` entries with a checked running sum |
//! | [`WarmupDispatcher`] | Fires every call of one batch and waits for all of them |
//! | [`DispatchReport`] | Per-call outcomes and timing of one dispatched batch |
//!
//! ## Example
//!
//! ```rust
//! use fleet_warmer::batch::BatchPlanner;
//! use fleet_warmer::config::{FunctionTarget, ScalingPolicy};
//! use fleet_warmer::forecast::ForecastResult;
//!
//! let scaling = ScalingPolicy::new(0, 50, 30);
//! let targets = vec![
//!     (FunctionTarget::new("a", "us-east-1").with_scaling(scaling), ForecastResult::from(vec![10])),
//!     (FunctionTarget::new("b", "us-east-1").with_scaling(scaling), ForecastResult::from(vec![25])),
//! ];
//!
//! let batches = BatchPlanner::new(30).unwrap().plan(&targets).unwrap();
//! assert_eq!(batches.len(), 2);
//! ```

mod dispatcher;
mod planner;

pub use dispatcher::{DispatchReport, WarmupDispatcher};
pub use planner::{BatchPlanner, WarmBatch, WarmEntry};
