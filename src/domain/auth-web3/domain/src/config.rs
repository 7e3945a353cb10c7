// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::Duration;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_NONCE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
pub struct Web3AuthConfig {
    /// How long an issued challenge stays consumable
    pub nonce_ttl: Duration,
    /// When set, sign-in messages addressed to any other domain are rejected
    pub expected_domain: Option<String>,
}

impl Default for Web3AuthConfig {
    fn default() -> Self {
        Self {
            nonce_ttl: Duration::minutes(DEFAULT_NONCE_TTL_MINUTES),
            expected_domain: None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
