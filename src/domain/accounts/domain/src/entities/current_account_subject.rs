// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use lectern_auth_web3::EvmWalletAddress;

use crate::{Account, AccountID, AccountRole};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Identity attached to a request. Resolved once per request and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub enum CurrentAccountSubject {
    Logged(LoggedAccount),
    Anonymous(AnonymousAccountReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedAccount {
    pub account_id: AccountID,
    pub wallet_address: EvmWalletAddress,
    pub role: AccountRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnonymousAccountReason {
    NoAuthenticationProvided,
    AuthenticationInvalid,
    AuthenticationExpired,
}

impl CurrentAccountSubject {
    pub fn anonymous(reason: AnonymousAccountReason) -> Self {
        Self::Anonymous(reason)
    }

    pub fn logged(account: &Account) -> Self {
        Self::Logged(LoggedAccount {
            account_id: account.id,
            wallet_address: account.wallet_address,
            role: account.role,
        })
    }

    pub fn account_id(&self) -> Option<&AccountID> {
        match self {
            Self::Logged(logged) => Some(&logged.account_id),
            Self::Anonymous(_) => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
