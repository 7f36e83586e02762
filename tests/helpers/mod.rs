//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use cerberus_auth::SessionService;
use cerberus_cache::memory::MemoryCacheProvider;
use cerberus_core::config::{AuthConfig, SessionConfig};
use cerberus_core::error::AppError;
use cerberus_core::result::AppResult;
use cerberus_core::traits::CacheProvider;
use cerberus_core::types::{Deadline, UserId};

pub const SECRET: &str = "integration-secret-0123456789abcdef";

/// How a faulty backend misbehaves for matching keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Return a backend error.
    Fail,
    /// Never complete; only a deadline ends the call.
    Stall,
}

#[derive(Debug, Default)]
struct Rules {
    set: Vec<(String, Fault)>,
    delete: Vec<(String, Fault)>,
}

/// In-memory backend that can fail or stall writes and deletes on chosen
/// key prefixes, add latency to every call, and records every delete it
/// receives.
#[derive(Debug, Default)]
pub struct FaultyCache {
    inner: MemoryCacheProvider,
    rules: Mutex<Rules>,
    latency: Mutex<Option<Duration>>,
    deletes: Mutex<Vec<String>>,
}

impl FaultyCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fault_set(&self, prefix: &str, fault: Fault) {
        self.rules.lock().unwrap().set.push((prefix.to_string(), fault));
    }

    pub fn fault_delete(&self, prefix: &str, fault: Fault) {
        self.rules
            .lock()
            .unwrap()
            .delete
            .push((prefix.to_string(), fault));
    }

    /// Every call sleeps this long before touching the store, like a
    /// network round trip.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn heal(&self) {
        *self.rules.lock().unwrap() = Rules::default();
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    /// Reads straight from the backing store, bypassing faults.
    pub async fn raw_get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }

    fn matching(rules: &[(String, Fault)], key: &str) -> Option<Fault> {
        rules
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix.as_str()))
            .map(|(_, fault)| *fault)
    }

    async fn round_trip(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn inject(fault: Option<Fault>, key: &str) -> AppResult<()> {
        match fault {
            Some(Fault::Fail) => Err(AppError::backend(format!("injected failure on {key}"))),
            Some(Fault::Stall) => {
                std::future::pending::<()>().await;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CacheProvider for FaultyCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.round_trip().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.round_trip().await;
        let fault = Self::matching(&self.rules.lock().unwrap().set, key);
        Self::inject(fault, key).await?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.round_trip().await;
        let fault = Self::matching(&self.rules.lock().unwrap().delete, key);
        Self::inject(fault, key).await?;
        self.inner.delete(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig::with_secret(SECRET)
}

pub fn service_with(cache: Arc<dyn CacheProvider>, session: SessionConfig) -> SessionService {
    SessionService::from_config(&auth_config(), &session, cache).expect("valid test config")
}

pub fn service(cache: Arc<dyn CacheProvider>) -> SessionService {
    service_with(cache, SessionConfig::default())
}

pub fn deadline() -> Deadline {
    Deadline::after(Duration::from_secs(2))
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}
