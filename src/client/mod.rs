//! Rate-limited remote call client
//!
//! This module wraps every remote operation with:
//! - The shared pacing gate
//! - Failure classification (soft throttle, hard throttle, fatal, transient)
//! - Unbounded throttle retries and bounded, jittered exponential backoff

mod classify;
mod retry;

pub use classify::{classify, FailureKind};
pub use retry::RetryingCaller;
