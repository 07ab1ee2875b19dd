//! Warm-up invocation client.
//!
//! One generic [`InvocationClient`] covers every kind of call the warmer makes:
//! the [`PayloadBuilder`] decides what is sent and the [`ResultFilter`] decides
//! whether the answer counts as a success.
//! Implementation details are split into submodules under `src/client/`.

mod filter;
mod invoker;
mod payload;

pub use filter::{EnvelopeStatus, ResultFilter, SuccessStatus};
pub use invoker::{InvocationClient, InvocationOutcome};
pub use payload::{PayloadBuilder, WarmUpPayload, WARM_UP_ACTION};
