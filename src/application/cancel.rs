//! Cooperative cancellation token carrying a cause.
//!
//! Backed by a `watch` channel, the same primitive the runtime uses for its
//! shutdown signal. The first `cancel` wins; its cause is what every waiter
//! observes.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::watch;

/// Cloneable cancellation signal. Clones share state.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tx: watch::Sender<Option<String>>,
    parent: Option<CancelToken>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner { tx, parent: None }),
        }
    }

    /// Token that fires when either it or `self` is cancelled.
    #[must_use]
    pub fn child(&self) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                tx,
                parent: Some(self.clone()),
            }),
        }
    }

    /// Cancel with `cause`. Later calls are no-ops.
    pub fn cancel(&self, cause: impl Into<String>) {
        let cause = cause.into();
        self.inner.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause);
            true
        });
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cause().is_some()
    }

    /// Cause of cancellation, own or inherited.
    #[must_use]
    pub fn cause(&self) -> Option<String> {
        if let Some(cause) = self.inner.tx.borrow().clone() {
            return Some(cause);
        }
        self.inner.parent.as_ref().and_then(Self::cause)
    }

    /// Resolves with the cause once the token (or an ancestor) is cancelled.
    pub fn cancelled(&self) -> BoxFuture<'_, String> {
        Box::pin(async move {
            let mut rx = self.inner.tx.subscribe();
            let own = async move {
                let cause = rx
                    .wait_for(Option::is_some)
                    .await
                    .ok()
                    .and_then(|cause| (*cause).clone());
                match cause {
                    Some(cause) => cause,
                    // Sender lives as long as `self`; never reached.
                    None => std::future::pending().await,
                }
            };
            match &self.inner.parent {
                None => own.await,
                Some(parent) => {
                    tokio::select! {
                        cause = own => cause,
                        cause = parent.cancelled() => cause,
                    }
                }
            }
        })
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
