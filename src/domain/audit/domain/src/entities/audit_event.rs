// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use lectern_accounts::AccountID;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type AuditEventID = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: AuditEventID,
    pub occurred_at: DateTime<Utc>,
    pub action: AuditAction,
    pub account_id: Option<AccountID>,
    pub source_address: Option<String>,
    pub http: Option<AuditHttpRequest>,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at,
            action,
            account_id: None,
            source_address: None,
            http: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_account_id(mut self, account_id: AccountID) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_maybe_account_id(mut self, maybe_account_id: Option<AccountID>) -> Self {
        self.account_id = maybe_account_id;
        self
    }

    pub fn with_source_address(mut self, source_address: impl Into<String>) -> Self {
        self.source_address = Some(source_address.into());
        self
    }

    pub fn with_http_request(
        mut self,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
    ) -> Self {
        self.http = Some(AuditHttpRequest {
            method: method.into(),
            path: path.into(),
            status,
        });
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditAction {
    NonceIssued,
    LoginSucceeded,
    LoginFailed,
    HttpMutation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditHttpRequest {
    pub method: String,
    pub path: String,
    pub status: u16,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
