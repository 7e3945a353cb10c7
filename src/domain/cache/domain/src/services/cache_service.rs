// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheKeyTtl;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Best-effort cache access. A store that is missing, failing or slow never
/// surfaces as an error: reads miss, writes are dropped, counters are `None`.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait CacheService: Send + Sync {
    /// Whether a store is configured at all
    fn is_enabled(&self) -> bool;

    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    async fn delete(&self, key: &str);

    async fn delete_pattern(&self, pattern: &str) -> usize;

    async fn exists(&self, key: &str) -> bool;

    async fn increment(&self, key: &str, ttl_if_created: Duration) -> Option<u64>;

    async fn ttl(&self, key: &str) -> Option<CacheKeyTtl>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Typed access on top of [`CacheService`]: values are stored as JSON, an
/// entry that no longer deserializes is treated as a miss
#[async_trait::async_trait]
pub trait CacheServiceJsonExt: CacheService {
    async fn get_json<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = self.get(key).await?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn set_json<T>(&self, key: &str, value: &T, ttl: Option<Duration>)
    where
        T: Serialize + Sync,
    {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to serialize cache entry");
            }
        }
    }
}

impl<S: CacheService + ?Sized> CacheServiceJsonExt for S {}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
