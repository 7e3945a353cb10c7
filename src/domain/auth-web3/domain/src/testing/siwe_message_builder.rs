// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{EvmWalletAddress, EvmWalletAddressConvertor};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const TEST_SIWE_DOMAIN: &str = "courses.example.com";

/// Renders EIP-4361 messages in the exact textual layout wallets produce
pub struct SiweMessageBuilder {
    domain: String,
    wallet_address: EvmWalletAddress,
    statement: Option<String>,
    chain_id: u64,
    nonce: String,
    issued_at: DateTime<Utc>,
    expiration_time: Option<DateTime<Utc>>,
    not_before: Option<DateTime<Utc>>,
}

impl SiweMessageBuilder {
    pub fn new(wallet_address: EvmWalletAddress, nonce: impl Into<String>) -> Self {
        Self {
            domain: TEST_SIWE_DOMAIN.to_string(),
            wallet_address,
            statement: Some("Sign in to the course platform".to_string()),
            chain_id: 1,
            nonce: nonce.into(),
            issued_at: Utc::now(),
            expiration_time: None,
            not_before: None,
        }
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn statement(mut self, statement: Option<&str>) -> Self {
        self.statement = statement.map(ToString::to_string);
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = issued_at;
        self
    }

    pub fn expiration_time(mut self, expiration_time: DateTime<Utc>) -> Self {
        self.expiration_time = Some(expiration_time);
        self
    }

    pub fn not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn build(&self) -> String {
        let mut lines = vec![
            format!(
                "{} wants you to sign in with your Ethereum account:",
                self.domain
            ),
            EvmWalletAddressConvertor::checksummed_string(&self.wallet_address),
            String::new(),
        ];

        if let Some(statement) = &self.statement {
            lines.push(statement.clone());
            lines.push(String::new());
        }

        lines.push(format!("URI: https://{}/login", self.domain));
        lines.push("Version: 1".to_string());
        lines.push(format!("Chain ID: {}", self.chain_id));
        lines.push(format!("Nonce: {}", self.nonce));
        lines.push(format!("Issued At: {}", rfc3339(self.issued_at)));

        if let Some(expiration_time) = self.expiration_time {
            lines.push(format!("Expiration Time: {}", rfc3339(expiration_time)));
        }
        if let Some(not_before) = self.not_before {
            lines.push(format!("Not Before: {}", rfc3339(not_before)));
        }

        lines.join("\n")
    }
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
