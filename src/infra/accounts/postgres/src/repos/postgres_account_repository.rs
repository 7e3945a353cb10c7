// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use internal_error::{ErrorIntoInternal, InternalError, ResultIntoInternal};
use lectern_auth_web3::{EvmWalletAddress, EvmWalletAddressConvertor};
use sqlx::PgPool;
use sqlx::error::DatabaseError;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ACCOUNT_COLUMNS: &str = "id, wallet_address, display_name, role, created_at, last_login_at";

#[derive(Debug, sqlx::FromRow)]
struct AccountRowModel {
    id: uuid::Uuid,
    wallet_address: String,
    display_name: Option<String>,
    role: AccountRole,
    created_at: DateTime<Utc>,
    last_login_at: DateTime<Utc>,
}

impl TryFrom<AccountRowModel> for Account {
    type Error = InternalError;

    fn try_from(row: AccountRowModel) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            wallet_address: EvmWalletAddressConvertor::parse(&row.wallet_address)
                .context_int_err(format!("stored wallet address of account {}", row.id))?,
            display_name: row.display_name,
            role: row.role,
            created_at: row.created_at,
            last_login_at: row.last_login_at,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct PostgresAccountRepository {
    pool: Arc<PgPool>,
}

#[dill::component(pub)]
#[dill::interface(dyn AccountRepository)]
impl PostgresAccountRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn convert_unique_constraint_violation(e: &dyn DatabaseError) -> CreateAccountErrorDuplicate {
        let account_field = match e.constraint() {
            Some("accounts_pkey") => CreateAccountDuplicateField::Id,
            Some("idx_accounts_wallet_address") => CreateAccountDuplicateField::WalletAddress,
            other => {
                tracing::error!(
                    error = ?e,
                    constraint = ?other,
                    "Unexpected Postgres unique violation"
                );
                CreateAccountDuplicateField::Id
            }
        };

        CreateAccountErrorDuplicate { account_field }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_account(&self, account: &Account) -> Result<(), CreateAccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, wallet_address, display_name, role, created_at, last_login_at)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(EvmWalletAddressConvertor::lowercase_string(
            &account.wallet_address,
        ))
        .bind(account.display_name.as_deref())
        .bind(account.role)
        .bind(account.created_at)
        .bind(account.last_login_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e: sqlx::Error| match e {
            sqlx::Error::Database(e) => {
                if e.is_unique_violation() {
                    CreateAccountError::Duplicate(Self::convert_unique_constraint_violation(
                        e.as_ref(),
                    ))
                } else {
                    CreateAccountError::Internal(e.int_err())
                }
            }
            _ => CreateAccountError::Internal(e.int_err()),
        })?;

        Ok(())
    }

    async fn get_account_by_id(
        &self,
        account_id: &AccountID,
    ) -> Result<Account, GetAccountByIdError> {
        let maybe_account_row = sqlx::query_as::<_, AccountRowModel>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(account_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .int_err()?;

        if let Some(account_row) = maybe_account_row {
            Ok(account_row.try_into()?)
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
        let maybe_account_row = sqlx::query_as::<_, AccountRowModel>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE wallet_address = $1"
        ))
        .bind(EvmWalletAddressConvertor::lowercase_string(wallet_address))
        .fetch_optional(self.pool.as_ref())
        .await
        .int_err()?;

        Ok(maybe_account_row.map(TryInto::try_into).transpose()?)
    }

    async fn update_last_login(
        &self,
        account_id: &AccountID,
        last_login_at: DateTime<Utc>,
    ) -> Result<(), UpdateAccountLastLoginError> {
        let update_result = sqlx::query(
            r#"
            UPDATE accounts SET last_login_at = $2 WHERE id = $1
            "#,
        )
        .bind(account_id)
        .bind(last_login_at)
        .execute(self.pool.as_ref())
        .await
        .int_err()?;

        if update_result.rows_affected() == 0 {
            return Err(UpdateAccountLastLoginError::NotFound(
                AccountNotFoundByIdError {
                    account_id: *account_id,
                },
            ));
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
