//! Retry guard around a shared database client.
//!
//! The client is built once at process start and handed around by `Arc`;
//! every call made through the guard goes through the shared retry policy.

use crate::retry::{with_retry, with_retry_notify, ErrorSignature, RetryEvent, RetryPolicy};
use std::future::Future;
use std::sync::Arc;

/// A database client paired with the retry policy its calls run under.
#[derive(Debug)]
pub struct RetryGuard<C> {
    client: Arc<C>,
    policy: Arc<RetryPolicy>,
}

impl<C> Clone for RetryGuard<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<C> RetryGuard<C> {
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self::from_shared(Arc::new(client), Arc::new(policy))
    }

    pub fn from_shared(client: Arc<C>, policy: Arc<RetryPolicy>) -> Self {
        Self { client, policy }
    }

    /// Direct access for calls that should not be retried.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run one unit of work against the client, retrying transient failures.
    pub async fn call<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        E: ErrorSignature,
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        with_retry(&self.policy, operation, || f(Arc::clone(&self.client))).await
    }

    /// Like [`RetryGuard::call`], reporting each scheduled retry to `notify`.
    pub async fn call_notify<T, E, F, Fut, N>(
        &self,
        operation: &str,
        mut f: F,
        notify: N,
    ) -> Result<T, E>
    where
        E: ErrorSignature,
        F: FnMut(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        N: FnMut(&RetryEvent),
    {
        with_retry_notify(
            &self.policy,
            operation,
            || f(Arc::clone(&self.client)),
            notify,
        )
        .await
    }
}
