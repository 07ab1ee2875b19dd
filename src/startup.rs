//! 冷启动时间估算：根据运行时与内存大小估算函数冷启动耗时。
//!
//! # Startup Time Estimation
//!
//! Cold-start latency is modelled per runtime family as a power law in the memory
//! size: `ceil(exp(intercept + slope * ln(memory_mb)))` milliseconds. Functions
//! attached to an isolated network pay a fixed extra setup cost on top.

use serde::{Deserialize, Serialize};

/// Estimate used when no regression exists for the runtime family.
pub const DEFAULT_STARTUP_MS: u64 = 1_000;

/// Added to every estimate for functions running inside an isolated network.
pub const ISOLATED_NETWORK_OVERHEAD_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeFamily {
    Python,
    Java,
    Nodejs,
    Go,
    Dotnet,
    Ruby,
    Unknown,
}

impl RuntimeFamily {
    /// Map a platform runtime identifier (e.g. `python3.12`, `nodejs20.x`) to its family.
    pub fn normalize(runtime: &str) -> Self {
        let runtime = runtime.to_lowercase();

        if runtime.contains("python") {
            RuntimeFamily::Python
        } else if runtime.contains("java") {
            RuntimeFamily::Java
        } else if runtime.contains("node") {
            RuntimeFamily::Nodejs
        } else if runtime.contains("go") {
            RuntimeFamily::Go
        } else if runtime.contains("dotnet") || runtime.contains("csharp") {
            RuntimeFamily::Dotnet
        } else if runtime.contains("ruby") {
            RuntimeFamily::Ruby
        } else {
            RuntimeFamily::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeFamily::Python => "python",
            RuntimeFamily::Java => "java",
            RuntimeFamily::Nodejs => "nodejs",
            RuntimeFamily::Go => "go",
            RuntimeFamily::Dotnet => "dotnet",
            RuntimeFamily::Ruby => "ruby",
            RuntimeFamily::Unknown => "unknown",
        }
    }

    /// Regression coefficients `(intercept, slope)` against `ln(memory_mb)`.
    fn coefficients(&self) -> Option<(f64, f64)> {
        match self {
            RuntimeFamily::Python => Some((6.16, -0.60)),
            RuntimeFamily::Java => Some((13.0777, -0.9392)),
            RuntimeFamily::Nodejs => Some((10.94, -1.36)),
            RuntimeFamily::Dotnet => Some((11.6596, -0.6464)),
            RuntimeFamily::Go | RuntimeFamily::Ruby | RuntimeFamily::Unknown => None,
        }
    }
}

impl std::fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StartupTimeEstimator {
    default_ms: u64,
    isolated_overhead_ms: u64,
}

impl StartupTimeEstimator {
    pub fn new() -> Self {
        Self {
            default_ms: DEFAULT_STARTUP_MS,
            isolated_overhead_ms: ISOLATED_NETWORK_OVERHEAD_MS,
        }
    }

    pub fn with_isolated_overhead_ms(mut self, ms: u64) -> Self {
        self.isolated_overhead_ms = ms;
        self
    }

    /// Estimated cold-start latency in milliseconds.
    pub fn estimate(&self, runtime: &str, memory_size_mb: u32, in_isolated_network: bool) -> u64 {
        self.estimate_family(RuntimeFamily::normalize(runtime), memory_size_mb, in_isolated_network)
    }

    pub fn estimate_family(
        &self,
        family: RuntimeFamily,
        memory_size_mb: u32,
        in_isolated_network: bool,
    ) -> u64 {
        let base = match family.coefficients() {
            // ln(0) is undefined; treat a missing memory size like an unknown runtime.
            Some((intercept, slope)) if memory_size_mb > 0 => {
                let memory_ln = f64::from(memory_size_mb).ln();
                (intercept + slope * memory_ln).exp().ceil() as u64
            }
            _ => self.default_ms,
        };

        if in_isolated_network {
            base + self.isolated_overhead_ms
        } else {
            base
        }
    }
}

impl Default for StartupTimeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_platform_runtime_names() {
        assert_eq!(RuntimeFamily::normalize("python3.12"), RuntimeFamily::Python);
        assert_eq!(RuntimeFamily::normalize("Java21"), RuntimeFamily::Java);
        assert_eq!(RuntimeFamily::normalize("nodejs20.x"), RuntimeFamily::Nodejs);
        assert_eq!(RuntimeFamily::normalize("go1.x"), RuntimeFamily::Go);
        assert_eq!(RuntimeFamily::normalize("dotnet8"), RuntimeFamily::Dotnet);
        assert_eq!(RuntimeFamily::normalize("csharp"), RuntimeFamily::Dotnet);
        assert_eq!(RuntimeFamily::normalize("ruby3.3"), RuntimeFamily::Ruby);
        assert_eq!(RuntimeFamily::normalize("provided.al2023"), RuntimeFamily::Unknown);
    }

    #[test]
    fn closed_form_matches() {
        let expected = (6.16_f64 - 0.60 * 512_f64.ln()).exp().ceil() as u64;
        assert_eq!(StartupTimeEstimator::new().estimate("python", 512, false), expected);
        assert_eq!(expected, 12);
    }

    #[test]
    fn unknown_runtime_uses_default() {
        let estimator = StartupTimeEstimator::new();
        assert_eq!(estimator.estimate("provided", 1024, false), DEFAULT_STARTUP_MS);
        assert_eq!(estimator.estimate("go1.x", 1024, false), DEFAULT_STARTUP_MS);
        assert_eq!(estimator.estimate("python3.9", 0, false), DEFAULT_STARTUP_MS);
    }

    #[test]
    fn isolated_network_adds_overhead() {
        let estimator = StartupTimeEstimator::new().with_isolated_overhead_ms(2_500);
        assert_eq!(estimator.estimate("java11", 3008, true), 259 + 2_500);
        assert_eq!(estimator.estimate("unknown", 128, true), DEFAULT_STARTUP_MS + 2_500);
    }
}
