//! End-to-end session flows through the public API.

mod support;

use std::time::Duration;

use dormant::domain::{InstanceInfo, SessionStatus};
use dormant::error::Error;
use dormant::port::{GroupMap, Store};
use dormant::testkit::provider::ScriptedProvider;
use dormant::CancelToken;
use support::session::{names, wire};

#[tokio::test]
async fn blocking_group_session_becomes_ready() {
    let w = wire(
        ScriptedProvider::new()
            .with_groups(GroupMap::from([(
                "default".to_string(),
                names(&["api", "worker"]),
            )]))
            .with_inspections(
                "worker",
                vec![
                    Ok(InstanceInfo::not_ready("worker", 0, 1)),
                    Ok(InstanceInfo::not_ready("worker", 0, 1)),
                    Ok(InstanceInfo::ready("worker", 1)),
                ],
            ),
    );
    w.manager.refresh_groups().await.unwrap();

    let session = w
        .manager
        .request_ready_session_group(
            &CancelToken::new(),
            "default",
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(session.status(), SessionStatus::Ready);
    assert_eq!(w.provider.start_count("api"), 1);
    assert_eq!(w.provider.start_count("worker"), 1);
    w.manager.shutdown().await;
}

#[tokio::test]
async fn session_serializes_in_name_order() {
    let w = wire(ScriptedProvider::new().with_inspections(
        "b",
        vec![Ok(InstanceInfo::not_ready("b", 0, 2))],
    ));

    let session = w
        .manager
        .request_session(&names(&["b", "a"]), Duration::from_secs(60))
        .await
        .unwrap();
    let json = serde_json::to_value(&session).unwrap();

    assert_eq!(json["status"], "not-ready");
    assert_eq!(json["instances"][0]["instance"]["name"], "a");
    assert_eq!(json["instances"][1]["instance"]["name"], "b");
    assert_eq!(json["instances"][1]["instance"]["desiredReplicas"], 2);
    w.manager.shutdown().await;
}

#[tokio::test]
async fn idle_session_is_stopped_and_restarted_on_demand() {
    let w = wire(ScriptedProvider::new());
    let ttl = Duration::from_millis(40);

    w.manager
        .request_session(&names(&["web"]), ttl)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(w.provider.stop_count("web"), 1);
    assert!(w.store.get("web").await.unwrap().is_none());

    let session = w
        .manager
        .request_session(&names(&["web"]), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(session.is_ready());
    assert_eq!(w.provider.start_count("web"), 2);
    w.manager.shutdown().await;
}

#[tokio::test]
async fn externally_stopped_instance_restarts_on_next_request() {
    let w = wire(ScriptedProvider::new());

    w.manager
        .request_session(&names(&["web"]), Duration::from_secs(60))
        .await
        .unwrap();
    w.provider.emit_stopped("web");
    tokio::time::sleep(Duration::from_millis(50)).await;

    w.manager
        .request_session(&names(&["web"]), Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(w.provider.start_count("web"), 2);
    assert_eq!(w.provider.stop_count("web"), 0);
    w.manager.shutdown().await;
}

#[tokio::test]
async fn provider_timeout_rejects_only_the_slow_instance() {
    let mut config = dormant::testkit::config::session();
    config.provider_timeout = Duration::from_millis(50);
    let provider = std::sync::Arc::new(
        ScriptedProvider::new().with_start_delay(Duration::from_millis(500)),
    );
    let store = std::sync::Arc::new(dormant::adapter::store::MemoryStore::new(
        dormant::testkit::config::expiration_interval(),
    ));
    let manager = dormant::SessionManager::new(provider.clone(), store, config).unwrap();

    let session = manager
        .request_session(&names(&["slow"]), Duration::from_secs(60))
        .await
        .unwrap();
    let state = session.get("slow").unwrap();
    assert!(matches!(state.error, Some(Error::Timeout { .. })));
    assert_eq!(session.status(), SessionStatus::NotReady);
}

#[tokio::test]
async fn shutdown_cancels_in_flight_starts() {
    let w = wire(ScriptedProvider::new().with_start_delay(Duration::from_secs(30)));

    let promise = w
        .manager
        .request_instance("web", Duration::from_secs(60))
        .await;
    w.manager.shutdown().await;

    let outcome = tokio::time::timeout(Duration::from_secs(1), promise.settled())
        .await
        .expect("shutdown settles pending starts");
    assert!(outcome.unwrap_err().is_cancelled());
}
