//! `wakeretry simulate` – drive a fake cold database through the retry loop.

use crate::cli::FailureKind;
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wakeretry_core::guard::RetryGuard;
use wakeretry_core::retry::{DbError, DelaySchedule, RetryPolicy};

/// Database stand-in that fails `failures` times before answering.
pub(crate) struct SimulatedDb {
    failures: usize,
    kind: FailureKind,
    code: String,
    calls: AtomicUsize,
}

impl SimulatedDb {
    pub(crate) fn new(failures: usize, kind: FailureKind, code: &str) -> Self {
        Self {
            failures,
            kind,
            code: code.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn select_one(&self) -> Result<u32, DbError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.failures {
            return Ok(1);
        }
        Err(match self.kind {
            FailureKind::Connection => DbError::initialization(
                "Can't reach database server at `localhost:5432`",
            ),
            FailureKind::Code => DbError::known(self.code.clone(), "simulated coded failure"),
            FailureKind::Message => DbError::unknown("connect ECONNREFUSED 127.0.0.1:5432"),
            FailureKind::Permanent => {
                DbError::known("P2002", "Unique constraint failed on the fields: (`email`)")
            }
        })
    }
}

pub async fn run_simulate(
    mut policy: RetryPolicy,
    failures: usize,
    kind: FailureKind,
    code: &str,
    fixed_ms: Option<u64>,
) -> Result<()> {
    if let Some(ms) = fixed_ms {
        policy.schedule = DelaySchedule::fixed(Duration::from_millis(ms));
    }
    let guard = RetryGuard::new(SimulatedDb::new(failures, kind, code), policy);

    let outcome = guard
        .call_notify(
            "simulate.select_one",
            |db| async move { db.select_one().await },
            |e| {
                println!(
                    "attempt {}/{} failed ({}), retrying in {} ms",
                    e.attempt,
                    e.total_attempts,
                    e.error_id,
                    e.delay.as_millis()
                )
            },
        )
        .await;

    let calls = guard.client().calls();
    match outcome {
        Ok(v) => println!("ok: {} after {} call(s)", v, calls),
        Err(e) => println!("failed after {} call(s): {}", calls, e),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_db_fails_then_answers() {
        let db = SimulatedDb::new(2, FailureKind::Message, "P1001");
        assert!(db.select_one().await.is_err());
        assert!(db.select_one().await.is_err());
        assert_eq!(db.select_one().await, Ok(1));
        assert_eq!(db.calls(), 3);
    }

    #[tokio::test]
    async fn permanent_kind_is_not_retried() {
        let guard = RetryGuard::new(
            SimulatedDb::new(5, FailureKind::Permanent, "P1001"),
            RetryPolicy::default(),
        );
        let out = guard
            .call("t", |db| async move { db.select_one().await })
            .await;
        assert!(out.is_err());
        assert_eq!(guard.client().calls(), 1);
    }
}
