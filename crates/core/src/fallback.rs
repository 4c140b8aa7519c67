//! Ordered "first success wins" evaluation of named strategies.
//!
//! Shared by watch-page stream resolution and the discovery-API chain.
//! Attempts are lazy futures run one at a time; a later attempt is never
//! polled once an earlier one produced a value.

use std::fmt::Display;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

/// One named strategy. `Ok(None)` means the strategy ran but found
/// nothing; `Err` means it failed.
pub struct Attempt<'a, T, E> {
    name: String,
    run: BoxFuture<'a, Result<Option<T>, E>>,
}

impl<'a, T, E> Attempt<'a, T, E> {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Future<Output = Result<Option<T>, E>> + Send + 'a,
    {
        Self {
            name: name.into(),
            run: run.boxed(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Value produced by the winning strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub strategy: String,
}

/// Result of running a chain of attempts.
#[derive(Debug)]
pub struct Outcome<T, E> {
    pub resolved: Option<Resolved<T>>,
    /// Failed attempts, in the order they ran.
    pub failures: Vec<(String, E)>,
}

impl<T, E> Outcome<T, E> {
    pub fn value(self) -> Option<T> {
        self.resolved.map(|r| r.value)
    }
}

/// Run `attempts` in order until one yields a value.
pub async fn first_success<'a, T, E: Display>(
    attempts: Vec<Attempt<'a, T, E>>,
) -> Outcome<T, E> {
    let mut failures = Vec::new();

    for attempt in attempts {
        match attempt.run.await {
            Ok(Some(value)) => {
                debug!(strategy = %attempt.name, "Strategy succeeded");
                return Outcome {
                    resolved: Some(Resolved {
                        value,
                        strategy: attempt.name,
                    }),
                    failures,
                };
            }
            Ok(None) => {
                debug!(strategy = %attempt.name, "Strategy found nothing");
            }
            Err(e) => {
                warn!(strategy = %attempt.name, error = %e, "Strategy failed");
                failures.push((attempt.name, e));
            }
        }
    }

    Outcome {
        resolved: None,
        failures,
    }
}
