//! Mock [`Provider`] for testing.
//!
//! [`ScriptedProvider`] answers inspections from a per-instance script,
//! counts every call, and can inject start delays, start/stop failures and
//! externally-stopped events.
//!
//! Inspection scripts pop one result per call and repeat the last one once
//! exhausted. Instances without a script inspect as Ready with one replica.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::application::cancel::CancelToken;
use crate::domain::{InstanceConfig, InstanceInfo, ListOptions};
use crate::error::{Error, Result};
use crate::port::{GroupMap, Provider};

#[derive(Default)]
struct Counters {
    starts: HashMap<String, u32>,
    stops: HashMap<String, u32>,
    inspects: HashMap<String, u32>,
}

/// Provider with scripted behavior and call counters.
pub struct ScriptedProvider {
    inspections: Mutex<HashMap<String, VecDeque<Result<InstanceInfo>>>>,
    start_failures: Mutex<HashMap<String, VecDeque<Error>>>,
    failing_stops: Mutex<HashSet<String>>,
    start_delay: Duration,
    stop_delay: Duration,
    instances: Mutex<Vec<InstanceConfig>>,
    groups: Mutex<Result<GroupMap>>,
    counters: Mutex<Counters>,
    events_tx: mpsc::UnboundedSender<String>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            inspections: Mutex::new(HashMap::new()),
            start_failures: Mutex::new(HashMap::new()),
            failing_stops: Mutex::new(HashSet::new()),
            start_delay: Duration::ZERO,
            stop_delay: Duration::ZERO,
            instances: Mutex::new(Vec::new()),
            groups: Mutex::new(Ok(GroupMap::new())),
            counters: Mutex::new(Counters::default()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Inspection results for `name`, one per call; the last repeats.
    pub fn with_inspections(self, name: &str, results: Vec<Result<InstanceInfo>>) -> Self {
        self.inspections
            .lock()
            .insert(name.to_string(), results.into());
        self
    }

    /// Errors returned by the next starts of `name`, in order.
    pub fn with_start_failures(self, name: &str, errors: Vec<Error>) -> Self {
        self.start_failures
            .lock()
            .insert(name.to_string(), errors.into());
        self
    }

    /// Every stop of `name` fails.
    pub fn with_failing_stop(self, name: &str) -> Self {
        self.failing_stops.lock().insert(name.to_string());
        self
    }

    /// Delay applied inside every start.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Delay applied inside every stop.
    pub fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    /// Instances returned by `instance_list`.
    pub fn with_instances(self, names: &[&str]) -> Self {
        *self.instances.lock() = names.iter().map(|n| InstanceConfig::new(*n)).collect();
        self
    }

    pub fn with_groups(self, groups: GroupMap) -> Self {
        *self.groups.lock() = Ok(groups);
        self
    }

    /// Replace the groups the provider reports from now on.
    pub fn set_groups(&self, groups: Result<GroupMap>) {
        *self.groups.lock() = groups;
    }

    /// Report `name` as stopped outside our control.
    pub fn emit_stopped(&self, name: &str) {
        let _ = self.events_tx.send(name.to_string());
    }

    pub fn start_count(&self, name: &str) -> u32 {
        self.counters.lock().starts.get(name).copied().unwrap_or(0)
    }

    pub fn stop_count(&self, name: &str) -> u32 {
        self.counters.lock().stops.get(name).copied().unwrap_or(0)
    }

    pub fn inspect_count(&self, name: &str) -> u32 {
        self.counters.lock().inspects.get(name).copied().unwrap_or(0)
    }

    /// Total stops across all instances.
    pub fn total_stops(&self) -> u32 {
        self.counters.lock().stops.values().sum()
    }

    fn next_inspection(&self, name: &str) -> Result<InstanceInfo> {
        let mut inspections = self.inspections.lock();
        match inspections.get_mut(name) {
            Some(script) if script.len() > 1 => script
                .pop_front()
                .unwrap_or_else(|| Ok(InstanceInfo::ready(name, 1))),
            Some(script) => script
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(InstanceInfo::ready(name, 1))),
            None => Ok(InstanceInfo::ready(name, 1)),
        }
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn instance_start(&self, _cancel: &CancelToken, name: &str) -> Result<()> {
        *self
            .counters
            .lock()
            .starts
            .entry(name.to_string())
            .or_default() += 1;
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        let failure = self
            .start_failures
            .lock()
            .get_mut(name)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn instance_stop(&self, _cancel: &CancelToken, name: &str) -> Result<()> {
        *self
            .counters
            .lock()
            .stops
            .entry(name.to_string())
            .or_default() += 1;
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        if self.failing_stops.lock().contains(name) {
            return Err(Error::provider(name, "stop refused"));
        }
        Ok(())
    }

    async fn instance_inspect(&self, _cancel: &CancelToken, name: &str) -> Result<InstanceInfo> {
        *self
            .counters
            .lock()
            .inspects
            .entry(name.to_string())
            .or_default() += 1;
        self.next_inspection(name)
    }

    async fn instance_list(
        &self,
        _cancel: &CancelToken,
        _options: ListOptions,
    ) -> Result<Vec<InstanceConfig>> {
        Ok(self.instances.lock().clone())
    }

    async fn instance_groups(&self, _cancel: &CancelToken) -> Result<GroupMap> {
        self.groups.lock().clone()
    }

    async fn notify_instance_stopped(&self, cancel: &CancelToken, stopped: mpsc::Sender<String>) {
        let Some(mut events) = self.events_rx.lock().take() else {
            return;
        };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                name = events.recv() => {
                    let Some(name) = name else { return };
                    if stopped.send(name).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
