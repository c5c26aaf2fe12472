use super::classify::{Classifier, FailureClass};
use super::error::ErrorSignature;
use crate::config::{ConfigError, RetryConfig};
use rand::Rng;
use std::time::Duration;

/// Default inter-attempt delays: a cold database usually answers within a few seconds.
pub const DEFAULT_DELAYS: [Duration; 3] = [
    Duration::from_millis(1000),
    Duration::from_millis(2000),
    Duration::from_millis(3000),
];

/// Default upper bound (exclusive) on the random jitter added to each delay.
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(250);

/// Ordered base delays between attempts, plus a jitter bound.
///
/// Entry `i` is the wait after failed attempt `i`, so a schedule of length `n`
/// allows `n + 1` attempts in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelaySchedule {
    delays: Vec<Duration>,
    jitter_max: Duration,
}

impl DelaySchedule {
    pub fn new(delays: Vec<Duration>, jitter_max: Duration) -> Self {
        Self { delays, jitter_max }
    }

    /// A single retry after a fixed delay, with no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self::new(vec![delay], Duration::ZERO)
    }

    /// No retries at all: the operation runs once.
    pub fn none() -> Self {
        Self::new(Vec::new(), Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delays.is_empty()
    }

    pub fn total_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    pub fn jitter_max(&self) -> Duration {
        self.jitter_max
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    pub fn base(&self, index: usize) -> Option<Duration> {
        self.delays.get(index).copied()
    }

    /// Base delay for `index` plus uniform jitter in `[0, jitter_max)`.
    pub fn jittered(&self, index: usize) -> Option<Duration> {
        let base = self.base(index)?;
        if self.jitter_max.is_zero() {
            return Some(base);
        }
        let jitter = rand::thread_rng().gen_range(Duration::ZERO..self.jitter_max);
        Some(base.saturating_add(jitter))
    }
}

impl Default for DelaySchedule {
    fn default() -> Self {
        Self::new(DEFAULT_DELAYS.to_vec(), DEFAULT_JITTER_MAX)
    }
}

/// Why the policy stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Failure is not transient.
    Permanent,
    /// Transient, but the schedule is used up.
    Exhausted,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; surface the error.
    NoRetry(StopReason),
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Classifier plus delay schedule. Read-only after construction; callers
/// share one instance (usually behind an `Arc`).
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    pub classifier: Classifier,
    pub schedule: DelaySchedule,
}

impl RetryPolicy {
    pub fn new(classifier: Classifier, schedule: DelaySchedule) -> Self {
        Self {
            classifier,
            schedule,
        }
    }

    /// Build from the `[retry]` config section.
    pub fn from_config(cfg: &RetryConfig) -> Result<Self, ConfigError> {
        let classifier = Classifier::new(&cfg.retryable_codes, &cfg.message_patterns)?;
        let schedule = DelaySchedule::new(
            cfg.delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            Duration::from_millis(cfg.jitter_max_ms),
        );
        Ok(Self::new(classifier, schedule))
    }

    pub fn total_attempts(&self) -> usize {
        self.schedule.total_attempts()
    }

    /// Decide what to do after attempt `attempt` (0-based) failed with `err`.
    pub fn decide<E: ErrorSignature + ?Sized>(&self, attempt: usize, err: &E) -> RetryDecision {
        self.decide_class(attempt, self.classifier.classify(err))
    }

    pub fn decide_class(&self, attempt: usize, class: FailureClass) -> RetryDecision {
        if !class.is_retryable() {
            return RetryDecision::NoRetry(StopReason::Permanent);
        }
        match self.schedule.jittered(attempt) {
            Some(delay) => RetryDecision::RetryAfter(delay),
            None => RetryDecision::NoRetry(StopReason::Exhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::DbError;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn jittered_delay_within_bounds() {
        let s = DelaySchedule::default();
        for _ in 0..500 {
            for (i, base) in DEFAULT_DELAYS.iter().enumerate() {
                let d = s.jittered(i).unwrap();
                assert!(d >= *base, "{:?} < {:?}", d, base);
                assert!(d < *base + DEFAULT_JITTER_MAX, "{:?} too large", d);
            }
        }
        assert_eq!(s.jittered(3), None);
    }

    #[test]
    fn zero_jitter_is_exact() {
        let s = DelaySchedule::fixed(ms(2000));
        assert_eq!(s.jittered(0), Some(ms(2000)));
        assert_eq!(s.jittered(1), None);
        assert_eq!(s.total_attempts(), 2);
    }

    #[test]
    fn attempts_are_schedule_len_plus_one() {
        assert_eq!(RetryPolicy::default().total_attempts(), 4);
        assert_eq!(DelaySchedule::none().total_attempts(), 1);
    }

    #[test]
    fn no_retry_for_permanent() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(0, &DbError::known("P2002", "Unique constraint failed")),
            RetryDecision::NoRetry(StopReason::Permanent)
        );
    }

    #[test]
    fn respects_schedule_length() {
        let p = RetryPolicy::default();
        let e = DbError::initialization("Can't reach database server");
        for attempt in 0..3 {
            assert!(matches!(p.decide(attempt, &e), RetryDecision::RetryAfter(_)));
        }
        assert_eq!(
            p.decide(3, &e),
            RetryDecision::NoRetry(StopReason::Exhausted)
        );
    }

    #[test]
    fn from_config_uses_configured_values() {
        let cfg = RetryConfig {
            delays_ms: vec![500],
            jitter_max_ms: 0,
            retryable_codes: vec!["X1".to_string()],
            message_patterns: vec!["blip".to_string()],
        };
        let p = RetryPolicy::from_config(&cfg).unwrap();
        assert_eq!(p.schedule.delays(), &[ms(500)]);
        assert_eq!(
            p.decide(0, &DbError::known("X1", "")),
            RetryDecision::RetryAfter(ms(500))
        );
        assert_eq!(
            p.decide(0, &DbError::unknown("network BLIP")),
            RetryDecision::RetryAfter(ms(500))
        );
        assert_eq!(
            p.decide(0, &DbError::known("P1001", "")),
            RetryDecision::NoRetry(StopReason::Permanent)
        );
    }
}
