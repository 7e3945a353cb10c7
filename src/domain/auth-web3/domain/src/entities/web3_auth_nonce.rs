// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use random_strings::get_random_name;
use regex::Regex;

use crate::EvmWalletAddress;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// 16 symbols out of 62 give ~95 bits of entropy
pub const WEB3_AUTH_NONCE_LENGTH: usize = 16;

// EIP-4361 itself only demands 8+ alphanumeric characters, so externally
// supplied nonces are validated against the protocol minimum
static EIP_4361_NONCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9]{8,}$").unwrap());

#[nutype::nutype(
    sanitize(trim),
    validate(regex = EIP_4361_NONCE_REGEX),
    derive(AsRef, Clone, Debug, Display, Eq, PartialEq, Hash, TryFrom)
)]
pub struct Web3AuthenticationNonce(String);

impl Web3AuthenticationNonce {
    pub fn new() -> Self {
        let value = get_random_name(None, WEB3_AUTH_NONCE_LENGTH);
        Self::try_new(value).expect("Invalid nonce generated")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Web3AuthNonceEntity {
    pub wallet_address: EvmWalletAddress,
    pub nonce: Web3AuthenticationNonce,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Web3AuthNonceEntity {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
