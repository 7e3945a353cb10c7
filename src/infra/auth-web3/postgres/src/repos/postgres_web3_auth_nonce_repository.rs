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
use internal_error::ResultIntoInternal;
use sqlx::PgPool;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct PostgresWeb3AuthNonceRepository {
    pool: Arc<PgPool>,
}

#[dill::component(pub)]
#[dill::interface(dyn Web3AuthNonceRepository)]
impl PostgresWeb3AuthNonceRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl Web3AuthNonceRepository for PostgresWeb3AuthNonceRepository {
    async fn set_nonce(&self, entity: &Web3AuthNonceEntity) -> Result<(), SetNonceError> {
        sqlx::query(
            r#"
            INSERT INTO web3_auth_nonces(wallet_address, nonce, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(EvmWalletAddressConvertor::lowercase_string(
            &entity.wallet_address,
        ))
        .bind(entity.nonce.as_ref())
        .bind(entity.created_at)
        .bind(entity.expires_at)
        .execute(self.pool.as_ref())
        .await
        .int_err()?;

        Ok(())
    }

    async fn consume_nonce(
        &self,
        wallet: &EvmWalletAddress,
        nonce: &Web3AuthenticationNonce,
        now: DateTime<Utc>,
    ) -> Result<(), ConsumeNonceError> {
        // A single conditional DELETE makes lookup and removal atomic
        let delete_result = sqlx::query(
            r#"
            DELETE
            FROM web3_auth_nonces
            WHERE wallet_address = $1
              AND nonce = $2
              AND expires_at > $3
            "#,
        )
        .bind(EvmWalletAddressConvertor::lowercase_string(wallet))
        .bind(nonce.as_ref())
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .int_err()?;

        if delete_result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(ConsumeNonceError::NotFound(NonceNotFoundError {
                wallet: *wallet,
            }))
        }
    }

    async fn cleanup_expired_nonces(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, CleanupExpiredNoncesError> {
        let delete_result = sqlx::query(
            r#"
            DELETE
            FROM web3_auth_nonces
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .int_err()?;

        usize::try_from(delete_result.rows_affected())
            .int_err()
            .map_err(CleanupExpiredNoncesError::Internal)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
