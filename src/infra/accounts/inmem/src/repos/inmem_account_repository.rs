// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dill::*;
use lectern_auth_web3::EvmWalletAddress;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryAccountRepository {
    state: Arc<Mutex<State>>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct State {
    accounts_by_id: HashMap<AccountID, Account>,
    account_id_by_wallet_address: HashMap<EvmWalletAddress, AccountID>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn AccountRepository)]
#[scope(Singleton)]
impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_account(&self, account: &Account) -> Result<(), CreateAccountError> {
        let mut guard = self.state.lock().unwrap();
        if guard.accounts_by_id.contains_key(&account.id) {
            return Err(CreateAccountError::Duplicate(CreateAccountErrorDuplicate {
                account_field: CreateAccountDuplicateField::Id,
            }));
        }
        if guard
            .account_id_by_wallet_address
            .contains_key(&account.wallet_address)
        {
            return Err(CreateAccountError::Duplicate(CreateAccountErrorDuplicate {
                account_field: CreateAccountDuplicateField::WalletAddress,
            }));
        }

        guard
            .account_id_by_wallet_address
            .insert(account.wallet_address, account.id);
        guard.accounts_by_id.insert(account.id, account.clone());

        Ok(())
    }

    async fn get_account_by_id(
        &self,
        account_id: &AccountID,
    ) -> Result<Account, GetAccountByIdError> {
        let guard = self.state.lock().unwrap();
        if let Some(account) = guard.accounts_by_id.get(account_id) {
            Ok(account.clone())
        } else {
            Err(GetAccountByIdError::NotFound(AccountNotFoundByIdError {
                account_id: *account_id,
            }))
        }
    }

    async fn find_account_by_wallet_address(
        &self,
        wallet_address: &EvmWalletAddress,
    ) -> Result<Option<Account>, FindAccountByWalletAddressError> {
        let guard = self.state.lock().unwrap();

        Ok(guard
            .account_id_by_wallet_address
            .get(wallet_address)
            .and_then(|account_id| guard.accounts_by_id.get(account_id))
            .cloned())
    }

    async fn update_last_login(
        &self,
        account_id: &AccountID,
        last_login_at: DateTime<Utc>,
    ) -> Result<(), UpdateAccountLastLoginError> {
        let mut guard = self.state.lock().unwrap();
        if let Some(account) = guard.accounts_by_id.get_mut(account_id) {
            account.last_login_at = last_login_at;
            Ok(())
        } else {
            Err(UpdateAccountLastLoginError::NotFound(
                AccountNotFoundByIdError {
                    account_id: *account_id,
                },
            ))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
