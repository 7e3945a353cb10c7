// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_CACHE_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Upper bound of a single store round-trip. A slower store is treated as
    /// unavailable for that call.
    pub operation_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            operation_timeout: DEFAULT_CACHE_OPERATION_TIMEOUT,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
