//! `wakeretry classify` – classify a described failure.

use wakeretry_core::retry::{DbError, RetryPolicy};

/// Build the failure the flags describe.
pub(crate) fn describe(message: &str, code: Option<String>, init: bool) -> DbError {
    match (init, code) {
        (true, code) => DbError::Initialization {
            code,
            message: message.to_string(),
        },
        (false, Some(code)) => DbError::known(code, message),
        (false, None) => DbError::unknown(message),
    }
}

pub fn run_classify(policy: &RetryPolicy, message: &str, code: Option<String>, init: bool) {
    let err = describe(message, code, init);
    let class = policy.classifier.classify(&err);
    println!(
        "{}: {:?} ({})",
        if class.is_retryable() {
            "retryable"
        } else {
            "not retryable"
        },
        class,
        policy.classifier.identifier(&err)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_prefers_init_flag() {
        assert!(matches!(
            describe("x", Some("P1001".to_string()), true),
            DbError::Initialization { code: Some(_), .. }
        ));
        assert_eq!(describe("x", Some("P2002".to_string()), false), DbError::known("P2002", "x"));
        assert_eq!(describe("x", None, false), DbError::unknown("x"));
    }
}
