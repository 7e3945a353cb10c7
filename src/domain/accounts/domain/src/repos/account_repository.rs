// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use internal_error::InternalError;
use lectern_auth_web3::EvmWalletAddress;
use thiserror::Error;

use crate::{Account, AccountID};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with [`CreateAccountError::Duplicate`] when the id or the wallet
    /// address is already taken
    async fn create_account(&self, account: &Account) -> Result<(), CreateAccountError>;

    async fn get_account_by_id(&self, account_id: &AccountID)
    -> Result<Account, GetAccountByIdError>;

    async fn find_account_by_wallet_address(
        &self,
        wallet_address: &EvmWalletAddress,
    ) -> Result<Option<Account>, FindAccountByWalletAddressError>;

    async fn update_last_login(
        &self,
        account_id: &AccountID,
        last_login_at: DateTime<Utc>,
    ) -> Result<(), UpdateAccountLastLoginError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum CreateAccountError {
    #[error(transparent)]
    Duplicate(CreateAccountErrorDuplicate),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Account not created, duplicate {account_field}")]
pub struct CreateAccountErrorDuplicate {
    pub account_field: CreateAccountDuplicateField,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CreateAccountDuplicateField {
    Id,
    WalletAddress,
}

impl Display for CreateAccountDuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Id => "id",
                Self::WalletAddress => "wallet address",
            },
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum GetAccountByIdError {
    #[error(transparent)]
    NotFound(AccountNotFoundByIdError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Account not found by ID: '{account_id}'")]
pub struct AccountNotFoundByIdError {
    pub account_id: AccountID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum FindAccountByWalletAddressError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum UpdateAccountLastLoginError {
    #[error(transparent)]
    NotFound(AccountNotFoundByIdError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
