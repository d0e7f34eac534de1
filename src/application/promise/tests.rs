use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// -- Helpers --------------------------------------------------------------

fn delayed_ok(value: u32, ms: u64) -> Promise<u32> {
    Promise::from_future(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(value)
    })
}

fn delayed_err(message: &'static str, ms: u64) -> Promise<u32> {
    Promise::from_future(async move {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Err(Error::provider("test", message))
    })
}

// -- Settlement -----------------------------------------------------------

#[tokio::test]
async fn resolve_fulfills() {
    let p = Promise::spawn(|s| async move {
        s.resolve(42u32);
    });
    assert_eq!(p.settled().await.unwrap(), 42);
    assert_eq!(p.status(), PromiseStatus::Fulfilled);
}

#[tokio::test]
async fn reject_rejects() {
    let p: Promise<u32> = Promise::spawn(|s| async move {
        s.reject(Error::provider("nginx", "no such container"));
    });
    let err = p.settled().await.unwrap_err();
    assert!(matches!(err, Error::Provider { .. }));
    assert_eq!(p.status(), PromiseStatus::Rejected);
}

#[tokio::test]
async fn first_settle_wins() {
    let p = Promise::spawn(|s| async move {
        assert!(s.resolve(1u32));
        assert!(!s.resolve(2));
        assert!(!s.reject(Error::Unsettled));
    });
    assert_eq!(p.settled().await.unwrap(), 1);
}

#[tokio::test]
async fn panicking_executor_rejects() {
    let p: Promise<u32> = Promise::spawn(|_s| async move {
        panic!("executor blew up");
    });
    match p.settled().await {
        Err(Error::Panicked(message)) => assert!(message.contains("executor blew up")),
        other => panic!("expected panic rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn executor_returning_without_settling_rejects() {
    let p: Promise<u32> = Promise::spawn(|_s| async move {});
    assert!(matches!(p.settled().await, Err(Error::Unsettled)));
}

#[tokio::test]
async fn clones_share_identity_and_outcome() {
    let p = delayed_ok(7, 10);
    let q = p.clone();
    assert!(p.ptr_eq(&q));
    assert!(!p.ptr_eq(&delayed_ok(7, 0)));
    let (a, b) = tokio::join!(p.settled(), q.settled());
    assert_eq!(a.unwrap(), 7);
    assert_eq!(b.unwrap(), 7);
}

#[tokio::test]
async fn peek_is_none_while_pending() {
    let p = delayed_ok(1, 50);
    assert!(p.is_pending());
    assert!(p.peek().is_none());
    p.settled().await.unwrap();
    assert_eq!(p.peek().unwrap().unwrap(), 1);
}

// -- Cancellation ---------------------------------------------------------

#[tokio::test]
async fn wait_returns_cancellation_without_altering_outcome() {
    let p = delayed_ok(5, 100);
    let cancel = CancelToken::new();
    cancel.cancel("client disconnected");

    let err = p.wait(&cancel).await.unwrap_err();
    match err {
        Error::Cancelled { cause } => assert_eq!(cause, "client disconnected"),
        other => panic!("expected cancellation, got {other:?}"),
    }

    // The underlying promise still fulfills.
    assert_eq!(p.settled().await.unwrap(), 5);
}

#[tokio::test]
async fn abandoning_wait_does_not_stop_executor() {
    let ran = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&ran);
    let p = Promise::from_future(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let cancel = CancelToken::new();
    let waiter = {
        let p = p.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { p.wait(&cancel).await })
    };
    cancel.cancel("gone");
    assert!(waiter.await.unwrap().is_err());

    p.settled().await.unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn wait_prefers_settled_value_over_cancelled_token() {
    let p = Promise::resolved(3u32);
    let cancel = CancelToken::new();
    cancel.cancel("late");
    assert_eq!(p.wait(&cancel).await.unwrap(), 3);
}

// -- Then / Catch ---------------------------------------------------------

#[tokio::test]
async fn then_transforms_value() {
    let p = delayed_ok(2, 5).then(|v| Ok(v * 10));
    assert_eq!(p.settled().await.unwrap(), 20);
}

#[tokio::test]
async fn then_transform_can_fail() {
    let p: Promise<u32> = delayed_ok(2, 5).then(|_| Err(Error::Store("nope".into())));
    assert!(matches!(p.settled().await, Err(Error::Store(_))));
}

#[tokio::test]
async fn then_propagates_rejection_without_calling_transform() {
    let called = Arc::new(AtomicU32::new(0));
    let c = Arc::clone(&called);
    let p = delayed_err("down", 5).then(move |v| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(v)
    });
    assert!(p.settled().await.is_err());
    assert_eq!(called.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn catch_recovers_from_rejection() {
    let p = delayed_err("down", 5).catch(|_| Ok(99));
    assert_eq!(p.settled().await.unwrap(), 99);
}

#[tokio::test]
async fn catch_handler_can_reject() {
    let p = delayed_err("down", 5).catch(|err| Err(Error::Store(err.to_string())));
    assert!(matches!(p.settled().await, Err(Error::Store(_))));
}

#[tokio::test]
async fn catch_passes_fulfillment_through() {
    let p = delayed_ok(4, 5).catch(|_| Ok(0));
    assert_eq!(p.settled().await.unwrap(), 4);
}

// -- All / AllSettled / Race ----------------------------------------------

#[tokio::test]
async fn all_preserves_input_order() {
    let p = all(vec![delayed_ok(1, 30), delayed_ok(2, 5), delayed_ok(3, 15)]);
    assert_eq!(p.settled().await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn all_rejects_without_waiting_for_stragglers() {
    let p = all(vec![delayed_ok(1, 5_000), delayed_err("boom", 5)]);
    let outcome = tokio::time::timeout(Duration::from_secs(1), p.settled())
        .await
        .expect("all() should reject before the slow input settles");
    assert!(outcome.is_err());
}

#[tokio::test]
async fn all_settled_waits_for_every_input_and_never_rejects() {
    let inputs = vec![delayed_ok(1, 20), delayed_err("x", 5)];
    let settled = all_settled(inputs).settled().await.unwrap();
    assert_eq!(settled.len(), 2);
    assert_eq!(settled[0].status(), PromiseStatus::Fulfilled);
    assert_eq!(settled[1].status(), PromiseStatus::Rejected);
}

#[tokio::test]
async fn race_takes_first_settled() {
    let p = race(vec![delayed_ok(1, 200), delayed_ok(2, 5)]);
    assert_eq!(p.settled().await.unwrap(), 2);

    let p = race(vec![delayed_ok(1, 200), delayed_err("fast", 5)]);
    assert!(p.settled().await.is_err());
}

#[test]
#[should_panic(expected = "requires at least one promise")]
fn all_panics_on_empty_input() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let _ = all::<u32>(Vec::new());
    });
}

#[test]
#[should_panic(expected = "requires at least one promise")]
fn race_panics_on_empty_input() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let _ = race::<u32>(Vec::new());
    });
}
