//! Retry and backoff policy.
//!
//! This module encapsulates failure classification (connection failures,
//! transient codes, transient message text) and jittered backoff decisions so
//! every database call in the process shares one consistent policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{Classifier, FailureClass, DEFAULT_MESSAGE_PATTERNS, DEFAULT_RETRYABLE_CODES};
pub use error::{DbError, ErrorSignature, Signature};
pub use policy::{
    DelaySchedule, RetryDecision, RetryPolicy, StopReason, DEFAULT_DELAYS, DEFAULT_JITTER_MAX,
};
pub use run::{with_retry, with_retry_notify, RetryEvent};
