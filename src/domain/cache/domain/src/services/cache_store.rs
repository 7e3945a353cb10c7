// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use internal_error::InternalError;
use thiserror::Error;

use crate::CacheKeyTtl;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Raw key/value backend. Every operation may fail, callers that need
/// best-effort semantics go through [`crate::CacheService`].
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Overwrites any previous value. Without `ttl` the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>)
    -> Result<(), CacheStoreError>;

    /// Returns whether a key was actually removed
    async fn delete(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Removes every key matching a glob pattern (`*`, `?`, `[...]`) and
    /// returns how many were removed
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError>;

    /// Atomically increments a counter and returns the new value. The TTL is
    /// applied only when this call created the counter, so repeated calls
    /// never extend its lifetime.
    async fn increment(&self, key: &str, ttl_if_created: Duration) -> Result<u64, CacheStoreError>;

    async fn ttl(&self, key: &str) -> Result<CacheKeyTtl, CacheStoreError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum CacheStoreError {
    #[error(transparent)]
    InvalidPattern(#[from] InvalidCachePatternError),

    #[error("Stored value of '{key}' is not a counter")]
    NotACounter { key: String },

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid cache key pattern '{pattern}': {reason}")]
pub struct InvalidCachePatternError {
    pub pattern: String,
    pub reason: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
