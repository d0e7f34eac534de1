//! Session manager wiring shared by the integration tests.

use std::sync::Arc;

use dormant::adapter::store::MemoryStore;
use dormant::port::{Provider, Store};
use dormant::testkit;
use dormant::testkit::provider::ScriptedProvider;
use dormant::SessionManager;

pub struct Wired {
    pub manager: Arc<SessionManager>,
    pub provider: Arc<ScriptedProvider>,
    pub store: Arc<MemoryStore>,
}

/// Manager over `provider` and a fast-sweeping in-memory store, started.
pub fn wire(provider: ScriptedProvider) -> Wired {
    let provider = Arc::new(provider);
    let store = Arc::new(MemoryStore::new(testkit::config::expiration_interval()));
    let manager = SessionManager::new(
        Arc::clone(&provider) as Arc<dyn Provider>,
        Arc::clone(&store) as Arc<dyn Store>,
        testkit::config::session(),
    )
    .expect("store accepts expiry hook");
    manager.start();
    Wired {
        manager,
        provider,
        store,
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}
