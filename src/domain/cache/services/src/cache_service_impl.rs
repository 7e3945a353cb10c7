// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lectern_cache::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[dill::component]
#[dill::interface(dyn CacheService)]
pub struct CacheServiceImpl {
    maybe_store: Option<Arc<dyn CacheStore>>,
    config: Arc<CacheConfig>,
}

impl CacheServiceImpl {
    /// Runs a store call within the configured deadline. Failures and
    /// timeouts are logged and collapse into `None`.
    async fn guarded<T, F, Fut>(&self, operation: &'static str, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(Arc<dyn CacheStore>) -> Fut,
        Fut: Future<Output = Result<T, CacheStoreError>>,
    {
        let store = self.maybe_store.clone()?;

        match tokio::time::timeout(self.config.operation_timeout, f(store)).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::error!(operation, key, error = ?e, error_msg = %e, "Cache operation failed");
                None
            }
            Err(_) => {
                tracing::error!(
                    operation,
                    key,
                    timeout = ?self.config.operation_timeout,
                    "Cache operation timed out"
                );
                None
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl CacheService for CacheServiceImpl {
    fn is_enabled(&self) -> bool {
        self.maybe_store.is_some()
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.guarded("get", key, |store| async move { store.get(key).await })
            .await
            .flatten()
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.guarded("set", key, |store| async move {
            store.set(key, value, ttl).await
        })
        .await;
    }

    async fn delete(&self, key: &str) {
        self.guarded("delete", key, |store| async move { store.delete(key).await })
            .await;
    }

    async fn delete_pattern(&self, pattern: &str) -> usize {
        self.guarded("delete_pattern", pattern, |store| async move {
            store.delete_pattern(pattern).await
        })
        .await
        .unwrap_or_default()
    }

    async fn exists(&self, key: &str) -> bool {
        self.guarded("exists", key, |store| async move { store.exists(key).await })
            .await
            .unwrap_or(false)
    }

    async fn increment(&self, key: &str, ttl_if_created: Duration) -> Option<u64> {
        self.guarded("increment", key, |store| async move {
            store.increment(key, ttl_if_created).await
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Option<CacheKeyTtl> {
        self.guarded("ttl", key, |store| async move { store.ttl(key).await })
            .await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
