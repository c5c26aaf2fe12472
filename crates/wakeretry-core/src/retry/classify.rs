//! Classify database client failures as transient (retry) or permanent.

use super::error::{ErrorSignature, Signature};
use crate::config::ConfigError;
use regex::{RegexBuilder, RegexSet, RegexSetBuilder};
use std::collections::HashSet;

/// Codes the client reports while the database is still waking up.
pub const DEFAULT_RETRYABLE_CODES: &[&str] = &[
    "P1001", // can't reach database server
    "P1002", // server reached but timed out
    "P1008", // operation timed out
    "P1017", // server closed the connection
    "P2024", // timed out fetching a connection from the pool
];

/// Text of transient network failures that arrive without a usable code.
pub const DEFAULT_MESSAGE_PATTERNS: &[&str] = &[
    r"can't reach database server|cannot reach|unreachable",
    r"econnrefused|connection refused",
    r"etimedout|timed out|timeout",
    r"econnreset|connection reset",
    r"enotfound|getaddrinfo|name resolution|could not resolve",
    r"server (has )?closed the connection|connection (was )?closed",
    r"terminat(ed|ing)",
];

/// Why a failure was (or was not) judged transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Never reached the server; always retried.
    Connection,
    /// Structured code in the retryable set.
    TransientCode,
    /// No usable code, but the message looks like a network blip.
    TransientMessage,
    /// Anything else (constraint violation, bad query, ...).
    Permanent,
}

impl FailureClass {
    pub fn is_retryable(self) -> bool {
        !matches!(self, FailureClass::Permanent)
    }
}

/// Pure predicate over failure signatures. Immutable once built; share it.
#[derive(Debug, Clone)]
pub struct Classifier {
    codes: HashSet<String>,
    patterns: RegexSet,
}

impl Classifier {
    /// Build from explicit code and pattern sets. Patterns match
    /// case-insensitively anywhere in the message.
    pub fn new<C, P>(codes: C, patterns: P) -> Result<Self, ConfigError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let codes = codes.into_iter().map(Into::into).collect();
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        // Compile one by one first so a bad entry can be named in the error.
        for p in &patterns {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|source| ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })?;
        }
        let patterns = RegexSetBuilder::new(&patterns)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: patterns.join(" | "),
                source,
            })?;

        Ok(Self { codes, patterns })
    }

    pub fn classify<E: ErrorSignature + ?Sized>(&self, err: &E) -> FailureClass {
        match err.signature() {
            Signature::Connection { .. } => FailureClass::Connection,
            Signature::Coded { code, .. } => {
                if self.codes.contains(code) {
                    FailureClass::TransientCode
                } else {
                    FailureClass::Permanent
                }
            }
            Signature::Uncoded { message } => {
                if self.patterns.is_match(&message) {
                    FailureClass::TransientMessage
                } else {
                    FailureClass::Permanent
                }
            }
        }
    }

    pub fn is_retryable<E: ErrorSignature + ?Sized>(&self, err: &E) -> bool {
        self.classify(err).is_retryable()
    }

    /// Short label for logs: the code when there is one.
    pub fn identifier<E: ErrorSignature + ?Sized>(&self, err: &E) -> String {
        let sig = err.signature();
        match (&sig, sig.code()) {
            (_, Some(code)) => code.to_string(),
            (Signature::Connection { .. }, None) => "initialization".to_string(),
            _ => "unknown".to_string(),
        }
    }

    pub fn retryable_codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn patterns(&self) -> &[String] {
        self.patterns.patterns()
    }
}

impl Default for Classifier {
    /// Built-in code and pattern sets. Should the patterns ever fail to
    /// compile, message matching is disabled and only codes classify.
    fn default() -> Self {
        Self::new(DEFAULT_RETRYABLE_CODES.iter().copied(), DEFAULT_MESSAGE_PATTERNS).unwrap_or_else(
            |err| {
                tracing::error!("built-in message patterns rejected: {}", err);
                Self {
                    codes: DEFAULT_RETRYABLE_CODES.iter().map(|c| c.to_string()).collect(),
                    patterns: RegexSet::empty(),
                }
            },
        )
    }
}
