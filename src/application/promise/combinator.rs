//! Promise combinators over collections.
//!
//! Each combinator requires at least one input; calling one with an empty
//! list is a caller bug and panics.

use futures_util::future::{select_all, try_join_all, FutureExt};

use super::Promise;

/// Fulfills with every value, in input order, once all inputs fulfill.
///
/// Rejects as soon as any input rejects, without waiting for the rest.
///
/// # Panics
///
/// Panics if `promises` is empty.
pub fn all<T>(promises: Vec<Promise<T>>) -> Promise<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    assert!(!promises.is_empty(), "all() requires at least one promise");
    Promise::from_future(async move { try_join_all(promises.iter().map(|p| p.settled())).await })
}

/// Fulfills with the input handles once every input has settled.
///
/// Never rejects; inspect each handle for its outcome.
///
/// # Panics
///
/// Panics if `promises` is empty.
pub fn all_settled<T>(promises: Vec<Promise<T>>) -> Promise<Vec<Promise<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    assert!(
        !promises.is_empty(),
        "all_settled() requires at least one promise"
    );
    Promise::from_future(async move {
        for promise in &promises {
            let _ = promise.settled().await;
        }
        Ok(promises)
    })
}

/// Settles like whichever input settles first.
///
/// # Panics
///
/// Panics if `promises` is empty.
pub fn race<T>(promises: Vec<Promise<T>>) -> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    assert!(!promises.is_empty(), "race() requires at least one promise");
    Promise::from_future(async move {
        let (outcome, _, _) = select_all(promises.iter().map(|p| p.settled().boxed())).await;
        outcome
    })
}
