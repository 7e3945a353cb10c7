// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use chrono::{DateTime, Utc};
use lectern_auth_web3::{EvmWalletAddress, EvmWalletAddressConvertor};
use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type AccountID = uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Platform user identified by the wallet that signed in
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Account {
    pub id: AccountID,
    pub wallet_address: EvmWalletAddress,
    pub display_name: Option<String>,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl Account {
    /// Account registered at its first wallet sign-in
    pub fn new_for_wallet(wallet_address: EvmWalletAddress, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountID::new_v4(),
            wallet_address,
            display_name: None,
            role: AccountRole::default(),
            created_at: now,
            last_login_at: now,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "account_role", rename_all = "lowercase")
)]
pub enum AccountRole {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Student => "student",
                Self::Instructor => "instructor",
                Self::Admin => "admin",
            },
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Public projection of [`Account`] returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: AccountID,
    pub wallet_address: String,
    pub display_name: Option<String>,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(value: &Account) -> Self {
        Self {
            id: value.id,
            wallet_address: EvmWalletAddressConvertor::checksummed_string(&value.wallet_address),
            display_name: value.display_name.clone(),
            role: value.role,
            created_at: value.created_at,
            last_login_at: value.last_login_at,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
