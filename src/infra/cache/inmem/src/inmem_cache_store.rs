// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dill::*;
use internal_error::ResultIntoInternal;
use time_source::SystemTimeSource;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryCacheStore {
    state: Arc<Mutex<State>>,
    time_source: Arc<dyn SystemTimeSource>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
}

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl State {
    /// Returns the entry only if it is still alive, dropping it otherwise
    fn live_entry(&mut self, key: &str, now: DateTime<Utc>) -> Option<&mut Entry> {
        if self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now))
        {
            self.entries.remove(key);
        }

        self.entries.get_mut(key)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn CacheStore)]
#[scope(Singleton)]
impl InMemoryCacheStore {
    pub fn new(time_source: Arc<dyn SystemTimeSource>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            time_source,
        }
    }

    fn expiry_after(&self, ttl: Duration) -> Result<DateTime<Utc>, CacheStoreError> {
        let ttl = chrono::Duration::from_std(ttl).int_err()?;
        Ok(self.time_source.now() + ttl)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let now = self.time_source.now();
        let mut guard = self.state.lock().unwrap();

        Ok(guard.live_entry(key, now).map(|entry| entry.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheStoreError> {
        let expires_at = ttl.map(|ttl| self.expiry_after(ttl)).transpose()?;

        let mut guard = self.state.lock().unwrap();
        guard.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError> {
        let now = self.time_source.now();
        let mut guard = self.state.lock().unwrap();

        let was_live = guard.live_entry(key, now).is_some();
        guard.entries.remove(key);

        Ok(was_live)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheStoreError> {
        let matcher = glob::Pattern::new(pattern).map_err(|e| InvalidCachePatternError {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let now = self.time_source.now();
        let mut guard = self.state.lock().unwrap();

        guard.entries.retain(|_, entry| !entry.is_expired_at(now));

        let count_before = guard.entries.len();
        guard.entries.retain(|key, _| !matcher.matches(key));

        Ok(count_before - guard.entries.len())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        let now = self.time_source.now();
        let mut guard = self.state.lock().unwrap();

        Ok(guard.live_entry(key, now).is_some())
    }

    async fn increment(&self, key: &str, ttl_if_created: Duration) -> Result<u64, CacheStoreError> {
        let now = self.time_source.now();
        let new_expires_at = self.expiry_after(ttl_if_created)?;

        let mut guard = self.state.lock().unwrap();

        if let Some(entry) = guard.live_entry(key, now) {
            let current: u64 = entry
                .value
                .parse()
                .map_err(|_| CacheStoreError::NotACounter {
                    key: key.to_string(),
                })?;

            let next = current + 1;
            entry.value = next.to_string();
            return Ok(next);
        }

        guard.entries.insert(
            key.to_string(),
            Entry {
                value: "1".to_string(),
                expires_at: Some(new_expires_at),
            },
        );

        Ok(1)
    }

    async fn ttl(&self, key: &str) -> Result<CacheKeyTtl, CacheStoreError> {
        let now = self.time_source.now();
        let mut guard = self.state.lock().unwrap();

        let Some(entry) = guard.live_entry(key, now) else {
            return Ok(CacheKeyTtl::Missing);
        };

        match entry.expires_at {
            None => Ok(CacheKeyTtl::NoExpiry),
            Some(expires_at) => Ok(CacheKeyTtl::Expires(
                (expires_at - now).to_std().int_err()?,
            )),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
