// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, TimeZone, Utc};
use lectern_auth_web3::EvmWalletAddress;

use crate::{Account, AccountID, AccountRole, CurrentAccountSubject};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn dummy_registration_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
}

impl Account {
    /// Deterministic account whose id and wallet derive from `seed`
    pub fn test(seed: u8, role: AccountRole) -> Self {
        Self {
            id: AccountID::from_bytes([seed; 16]),
            wallet_address: EvmWalletAddress::repeat_byte(seed),
            display_name: Some(format!("user-{seed}")),
            role,
            created_at: dummy_registration_time(),
            last_login_at: dummy_registration_time(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct CurrentAccountSubjectTestHelper {}

impl CurrentAccountSubjectTestHelper {
    pub fn logged(seed: u8) -> CurrentAccountSubject {
        CurrentAccountSubject::logged(&Account::test(seed, AccountRole::Student))
    }

    pub fn anonymous() -> CurrentAccountSubject {
        CurrentAccountSubject::anonymous(crate::AnonymousAccountReason::NoAuthenticationProvided)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
