// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dill::*;
use internal_error::{InternalError, ResultIntoInternal};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const SCAN_BATCH_SIZE: usize = 500;

// INCR and the first PEXPIRE must be atomic, otherwise a crash in between
// leaves a counter that never resets
static INCREMENT_WITH_TTL_SCRIPT: LazyLock<redis::Script> = LazyLock::new(|| {
    redis::Script::new(
        r"
        local current = redis.call('INCR', KEYS[1])
        if current == 1 then
            redis.call('PEXPIRE', KEYS[1], ARGV[1])
        end
        return current
        ",
    )
});

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Opens a self-reconnecting connection to the Redis server at `url`
pub async fn connect_redis(
    url: &str,
    connection_timeout: Duration,
) -> Result<ConnectionManager, InternalError> {
    let client = redis::Client::open(url).int_err()?;

    let config = ConnectionManagerConfig::new()
        .set_connection_timeout(connection_timeout)
        .set_response_timeout(connection_timeout);

    ConnectionManager::new_with_config(client, config)
        .await
        .context_int_err("connecting to the cache store")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct RedisCacheStore {
    connection: Arc<ConnectionManager>,
}

#[component(pub)]
#[interface(dyn CacheStore)]
impl RedisCacheStore {
    pub fn new(connection: Arc<ConnectionManager>) -> Self {
        Self { connection }
    }

    // Multiplexed: clones share one underlying connection
    fn connection(&self) -> ConnectionManager {
        self.connection.as_ref().clone()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.connection())
            .await
            .int_err()?;

        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheStoreError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(millis(ttl));
        }

        let _: () = cmd.query_async(&mut self.connection()).await.int_err()?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError> {
        let removed: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut self.connection())
            .await
            .int_err()?;

        Ok(removed > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheStoreError> {
        let mut connection = self.connection();

        let mut matched_keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH_SIZE)
                .query_async(&mut connection)
                .await
                .int_err()?;

            matched_keys.extend(keys);

            if next_cursor == 0 {
                break;
            }
            cursor = next_cursor;
        }

        if matched_keys.is_empty() {
            return Ok(0);
        }

        let removed: usize = redis::cmd("DEL")
            .arg(&matched_keys)
            .query_async(&mut connection)
            .await
            .int_err()?;

        tracing::debug!(pattern, removed, "Deleted cache keys by pattern");

        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        let count: u64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut self.connection())
            .await
            .int_err()?;

        Ok(count > 0)
    }

    async fn increment(&self, key: &str, ttl_if_created: Duration) -> Result<u64, CacheStoreError> {
        let count: u64 = INCREMENT_WITH_TTL_SCRIPT
            .key(key)
            .arg(millis(ttl_if_created))
            .invoke_async(&mut self.connection())
            .await
            .int_err()?;

        Ok(count)
    }

    async fn ttl(&self, key: &str) -> Result<CacheKeyTtl, CacheStoreError> {
        let remaining_ms: i64 = redis::cmd("PTTL")
            .arg(key)
            .query_async(&mut self.connection())
            .await
            .int_err()?;

        Ok(match remaining_ms {
            -2 => CacheKeyTtl::Missing,
            -1 => CacheKeyTtl::NoExpiry,
            ms => CacheKeyTtl::Expires(Duration::from_millis(ms.unsigned_abs())),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
