//! Single-assignment asynchronous results.
//!
//! A [`Promise`] is produced by a background task and settles exactly once,
//! either Fulfilled with a value or Rejected with an [`Error`]. Any number of
//! handles (clones) may await it; all observe the same outcome.
//!
//! Settlement is latched through a `watch` channel: the first
//! `resolve`/`reject` flips the state out of `Pending`, every later call is a
//! no-op. Executors that panic or return without settling still reject, so a
//! promise never stays Pending because of an executor fault.
//!
//! # Combinators
//!
//! - [`Promise::then`] / [`Promise::catch`] - transform fulfillment / recover
//!   from rejection
//! - [`all`] - every value in order, or the first observed error
//! - [`all_settled`] - barrier over every input, never rejects
//! - [`race`] - whichever input settles first

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tracing::warn;

use crate::application::cancel::CancelToken;
use crate::error::{Error, Result};

mod combinator;

pub use combinator::{all, all_settled, race};

/// Observable settlement state of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseStatus {
    Pending,
    Fulfilled,
    Rejected,
}

enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(Error),
}

impl<T: Clone> State<T> {
    const fn status(&self) -> PromiseStatus {
        match self {
            Self::Pending => PromiseStatus::Pending,
            Self::Fulfilled(_) => PromiseStatus::Fulfilled,
            Self::Rejected(_) => PromiseStatus::Rejected,
        }
    }

    fn outcome(&self) -> Option<Result<T>> {
        match self {
            Self::Pending => None,
            Self::Fulfilled(value) => Some(Ok(value.clone())),
            Self::Rejected(err) => Some(Err(err.clone())),
        }
    }
}

/// Handle to a single-assignment asynchronous result. Clones share identity.
pub struct Promise<T> {
    shared: Arc<watch::Sender<State<T>>>,
}

/// Settles the promise it was created for. Only the first call has effect.
pub struct Settler<T> {
    shared: Arc<watch::Sender<State<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for Settler<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Settler<T> {
    /// Fulfill with `value`. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(State::Fulfilled(value))
    }

    /// Reject with `err`. Returns false if already settled.
    pub fn reject(&self, err: Error) -> bool {
        self.settle(State::Rejected(err))
    }

    fn settle(&self, next: State<T>) -> bool {
        self.shared.send_if_modified(move |state| {
            if !matches!(state, State::Pending) {
                return false;
            }
            *state = next;
            true
        })
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Launch `executor` on its own task and return a handle immediately.
    ///
    /// The executor must call `resolve` or `reject` before its future
    /// completes. If it panics the promise rejects with [`Error::Panicked`];
    /// if it returns without settling, with [`Error::Unsettled`].
    pub fn spawn<F, Fut>(executor: F) -> Self
    where
        F: FnOnce(Settler<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, _) = watch::channel(State::Pending);
        let shared = Arc::new(tx);
        let settler = Settler {
            shared: Arc::clone(&shared),
        };
        let guard = settler.clone();

        tokio::spawn(async move {
            let run = AssertUnwindSafe(async move { executor(settler).await }).catch_unwind();
            match run.await {
                Ok(()) => {
                    if guard.reject(Error::Unsettled) {
                        warn!("Promise executor returned without settling");
                    }
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(panic = %message, "Promise executor panicked");
                    guard.reject(Error::Panicked(message));
                }
            }
        });

        Self { shared }
    }

    /// Promise settled with the output of `future`.
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self::spawn(move |settler| async move {
            match future.await {
                Ok(value) => settler.resolve(value),
                Err(err) => settler.reject(err),
            };
        })
    }

    /// Already-fulfilled promise.
    pub fn resolved(value: T) -> Self {
        let (tx, _) = watch::channel(State::Fulfilled(value));
        Self {
            shared: Arc::new(tx),
        }
    }

    /// Already-rejected promise.
    pub fn rejected(err: Error) -> Self {
        let (tx, _) = watch::channel(State::Rejected(err));
        Self {
            shared: Arc::new(tx),
        }
    }

    #[must_use]
    pub fn status(&self) -> PromiseStatus {
        self.shared.borrow().status()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status() == PromiseStatus::Pending
    }

    /// Outcome if settled, without waiting.
    #[must_use]
    pub fn peek(&self) -> Option<Result<T>> {
        self.shared.borrow().outcome()
    }

    /// True if both handles refer to the same promise.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Wait for settlement.
    pub async fn settled(&self) -> Result<T> {
        let mut rx = self.shared.subscribe();
        let outcome = rx
            .wait_for(|state| !matches!(state, State::Pending))
            .await
            .ok()
            .and_then(|state| state.outcome());
        // The sender lives inside `self`, so the channel cannot close here.
        outcome.unwrap_or(Err(Error::Unsettled))
    }

    /// Wait for settlement or for `cancel` to fire, whichever comes first.
    ///
    /// Cancellation only abandons local waiting; the promise still settles
    /// on its own.
    pub async fn wait(&self, cancel: &CancelToken) -> Result<T> {
        tokio::select! {
            biased;
            outcome = self.settled() => outcome,
            cause = cancel.cancelled() => Err(Error::Cancelled { cause }),
        }
    }

    /// Apply a fallible `transform` to the fulfilled value.
    pub fn then<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let source = self.clone();
        Promise::from_future(async move { transform(source.settled().await?) })
    }

    /// Recover from rejection with `handler`; fulfillment passes through.
    pub fn catch<F>(&self, handler: F) -> Promise<T>
    where
        F: FnOnce(Error) -> Result<T> + Send + 'static,
    {
        let source = self.clone();
        Promise::from_future(async move {
            match source.settled().await {
                Ok(value) => Ok(value),
                Err(err) => handler(err),
            }
        })
    }
}

impl<T: Clone> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("status", &self.shared.borrow().status())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests;
