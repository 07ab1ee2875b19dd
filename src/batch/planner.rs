//! Batch planner.

use crate::config::FunctionTarget;
use crate::forecast::ForecastResult;
use crate::{Error, ErrorContext, Result};
use serde::Serialize;

/// One target and the number of containers to warm for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmEntry {
    pub target: FunctionTarget,
    pub warm_count: u32,
}

impl WarmEntry {
    pub fn new(target: FunctionTarget, warm_count: u32) -> Self {
        Self { target, warm_count }
    }
}

/// Entries dispatched together. `sum` never exceeds `capacity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmBatch {
    entries: Vec<WarmEntry>,
    sum: u32,
    capacity: u32,
}

impl WarmBatch {
    pub fn new(capacity: u32) -> Self {
        Self {
            entries: Vec::new(),
            sum: 0,
            capacity,
        }
    }

    pub fn fits(&self, warm_count: u32) -> bool {
        self.sum
            .checked_add(warm_count)
            .map_or(false, |total| total <= self.capacity)
    }

    /// Adds the entry if it fits, otherwise hands it back.
    pub fn try_push(&mut self, entry: WarmEntry) -> std::result::Result<(), WarmEntry> {
        if !self.fits(entry.warm_count) {
            return Err(entry);
        }
        self.sum += entry.warm_count;
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[WarmEntry] {
        &self.entries
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.target.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchPlanner {
    global_max_concurrency: u32,
}

impl BatchPlanner {
    /// A zero budget could never hold a call and is rejected.
    pub fn new(global_max_concurrency: u32) -> Result<Self> {
        if global_max_concurrency == 0 {
            return Err(Error::config_validation("max_concurrency must be greater than zero")
                .with_context(
                    ErrorContext::new()
                        .with_field_path("default.scaling.max_concurrency")
                        .with_source("batch_planner"),
                ));
        }
        Ok(Self {
            global_max_concurrency,
        })
    }

    pub fn global_max_concurrency(&self) -> u32 {
        self.global_max_concurrency
    }

    pub fn warm_count(&self, target: &FunctionTarget, forecast: &ForecastResult) -> u32 {
        target
            .scaling
            .warm_count(forecast.peak(), self.global_max_concurrency)
    }

    /// First-fit in input order: each entry goes into the earliest batch with room,
    /// or opens a new batch when none has room.
    pub fn plan(&self, targets: &[(FunctionTarget, ForecastResult)]) -> Result<Vec<WarmBatch>> {
        let mut batches: Vec<WarmBatch> = Vec::new();

        'targets: for (target, forecast) in targets {
            let mut entry = WarmEntry::new(target.clone(), self.warm_count(target, forecast));
            for batch in batches.iter_mut() {
                match batch.try_push(entry) {
                    Ok(()) => continue 'targets,
                    Err(rejected) => entry = rejected,
                }
            }

            let mut batch = WarmBatch::new(self.global_max_concurrency);
            if let Err(rejected) = batch.try_push(entry) {
                return Err(Error::config_validation(format!(
                    "warm count {} exceeds the concurrency budget {}",
                    rejected.warm_count, self.global_max_concurrency
                ))
                .with_context(ErrorContext::new().with_target(rejected.target.name)));
            }
            batches.push(batch);
        }

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScalingPolicy;
    use crate::ErrorKind;

    fn target(name: &str, peak: u32, min: u32, max: u32) -> (FunctionTarget, ForecastResult) {
        (
            FunctionTarget::new(name, "us-east-1").with_scaling(ScalingPolicy::new(min, max, 50)),
            ForecastResult::from(vec![peak]),
        )
    }

    #[test]
    fn batch_rejects_overflow() {
        let mut batch = WarmBatch::new(10);
        let first = WarmEntry::new(FunctionTarget::new("a", "us-east-1"), 7);
        let second = WarmEntry::new(FunctionTarget::new("b", "us-east-1"), 4);

        assert!(batch.try_push(first).is_ok());
        let rejected = batch.try_push(second).unwrap_err();
        assert_eq!(rejected.target.name, "b");
        assert_eq!(batch.sum(), 7);
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = BatchPlanner::new(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidationFailed);
    }

    #[test]
    fn first_fit_reuses_earlier_batches() {
        let targets = vec![
            target("a", 10, 0, 50),
            target("b", 15, 0, 50),
            target("c", 30, 0, 50),
            target("d", 5, 0, 50),
            target("e", 21, 0, 50),
        ];
        let batches = BatchPlanner::new(30).unwrap().plan(&targets).unwrap();

        let names: Vec<Vec<&str>> = batches.iter().map(|b| b.names()).collect();
        assert_eq!(names, vec![vec!["a", "b", "d"], vec!["c"], vec!["e"]]);
        let sums: Vec<u32> = batches.iter().map(|b| b.sum()).collect();
        assert_eq!(sums, vec![30, 30, 21]);
    }

    #[test]
    fn warm_counts_are_clamped_to_the_budget() {
        let targets = vec![target("big", 80, 1, 100)];
        let batches = BatchPlanner::new(30).unwrap().plan(&targets).unwrap();
        assert_eq!(batches[0].entries()[0].warm_count, 30);
    }

    #[test]
    fn zero_warm_count_stays_in_the_plan() {
        let targets = vec![target("a", 30, 0, 50), target("idle", 0, 0, 50)];
        let batches = BatchPlanner::new(30).unwrap().plan(&targets).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].names(), vec!["a", "idle"]);
    }

    #[test]
    fn empty_input_plans_nothing() {
        assert!(BatchPlanner::new(5).unwrap().plan(&[]).unwrap().is_empty());
    }
}
