//! 机群配置层：加载、验证并展开函数预热配置。
//!
//! # Fleet Configuration
//!
//! A fleet configuration names the functions to keep warm and the scaling bounds
//! that apply to them:
//!
//! ```yaml
//! default:
//!   region: us-east-1
//!   scaling:
//!     max_concurrency: 50
//!     min_containers: 1
//!     max_containers: 50
//! lambda_functions:
//!   - name: checkout-api
//!   - name: image-resizer
//!     region: eu-west-1
//!     scaling:
//!       min_containers: 2
//!       max_containers: 10
//! ```
//!
//! Each function record is shallow-merged over the `default` record (function keys
//! win), and the `default` record itself is merged over the built-in defaults.
//! `default.scaling.max_concurrency` is the fleet-wide concurrency budget.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fleet`] | Fleet, target and scaling policy types plus record merging |
//! | [`loader`] | Config providers for local files, remote URLs and in-memory values |
//! | [`validator`] | JSON Schema validation of the raw document |

pub mod fleet;
pub mod loader;
pub mod validator;

pub use fleet::{
    builtin_default, merge_records, FleetConfig, FunctionTarget, Record, ScalingPolicy,
    DEFAULT_REGION,
};
pub use loader::{
    provider_for_source, ConfigProvider, FileConfigProvider, StaticConfigProvider,
    UrlConfigProvider,
};
pub use validator::ConfigValidator;
