//! Test doubles and common utilities for poll loop contract tests
//!
//! Each double keeps its counters behind `Arc`s and is `Clone`, so a test can
//! hand one clone to the loop and keep another for assertions.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wanddns_core::error::{Error, Result};
use wanddns_core::traits::{IpResolver, Notifier, RecordClient, RecordId};
use wanddns_core::{EngineConfig, RecordConfig, WanIp};

/// Record name used throughout the contract tests
pub const RECORD_NAME: &str = "home.example.com";

/// Record id returned by a successful lookup
pub const RECORD_ID: &str = "372e67954025e0ba6aaa6d586b9e0b59";

/// A resolver that replays a fixed script of answers
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<Result<WanIp>>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    /// Resolve to each entry in turn; `None` means "could not resolve"
    pub fn new(script: &[Option<&str>]) -> Self {
        let script = script
            .iter()
            .map(|entry| match entry {
                Some(ip) => Ok(WanIp::new(ip)),
                None => Err(Error::ip_source("status page had no IPv4-shaped cell")),
            })
            .collect();

        Self {
            script: Arc::new(Mutex::new(script)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always resolve to the same IP
    pub fn constant(ip: &str) -> Self {
        Self::new(&[Some(ip); 64])
    }

    /// Get the number of times resolve_wan_ip() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve_wan_ip(&self) -> Result<WanIp> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::ip_source("script exhausted")))
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// How the mock answers record lookups
#[derive(Clone, Copy)]
pub enum LookupBehavior {
    Found,
    NotFound,
    TransportError,
}

/// A mock RecordClient that tracks calls
#[derive(Clone)]
pub struct MockRecordClient {
    lookup: LookupBehavior,
    /// Queued update answers; an empty queue means success
    update_script: Arc<Mutex<VecDeque<Result<()>>>>,
    lookup_call_count: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockRecordClient {
    pub fn new(lookup: LookupBehavior) -> Self {
        Self {
            lookup,
            update_script: Arc::new(Mutex::new(VecDeque::new())),
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A client whose lookup succeeds and whose updates all succeed
    pub fn healthy() -> Self {
        Self::new(LookupBehavior::Found)
    }

    /// Make the next update call fail with a provider-reported error
    pub fn fail_next_update(&self, message: &str) {
        self.update_script
            .lock()
            .unwrap()
            .push_back(Err(Error::provider("mock", message)));
    }

    /// Get the number of times lookup_record_id() was called
    pub fn lookup_call_count(&self) -> usize {
        self.lookup_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// IPs passed to update_record(), in call order
    pub fn updated_ips(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ip)| ip.clone())
            .collect()
    }

    /// Record ids passed to update_record(), in call order
    pub fn updated_ids(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl RecordClient for MockRecordClient {
    async fn lookup_record_id(&self, record: &RecordConfig) -> Result<RecordId> {
        self.lookup_call_count.fetch_add(1, Ordering::SeqCst);
        match self.lookup {
            LookupBehavior::Found => Ok(RecordId::new(RECORD_ID)),
            LookupBehavior::NotFound => Err(Error::not_found(format!(
                "DNS record not found: {} (type: {})",
                record.name, record.record_type
            ))),
            LookupBehavior::TransportError => Err(Error::http("connection refused")),
        }
    }

    async fn update_record(
        &self,
        id: &RecordId,
        _record: &RecordConfig,
        new_ip: &WanIp,
    ) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), new_ip.to_string()));
        self.update_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A notifier that records every message it is asked to send
#[derive(Clone)]
pub struct RecordingNotifier {
    delivers: bool,
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    /// A notifier whose endpoint accepts everything
    pub fn accepting() -> Self {
        Self {
            delivers: true,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A notifier whose endpoint rejects everything
    pub fn rejecting() -> Self {
        Self {
            delivers: false,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every message passed to send(), in call order
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of messages containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.contains(needle))
            .count()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> bool {
        self.messages.lock().unwrap().push(message.to_string());
        self.delivers
    }
}

/// The record managed in tests
pub fn record() -> RecordConfig {
    RecordConfig::new(RECORD_NAME)
}

/// Loop settings with the given interval
pub fn engine_config(interval_secs: u64) -> EngineConfig {
    EngineConfig { interval_secs }
}
