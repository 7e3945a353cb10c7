// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use internal_error::{InternalError, ResultIntoInternal};
use lectern_auth_web3::*;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[dill::component]
#[dill::interface(dyn Web3NonceService)]
pub struct Web3NonceServiceImpl {
    nonce_repo: Arc<dyn Web3AuthNonceRepository>,
    time_source: Arc<dyn SystemTimeSource>,
    config: Arc<Web3AuthConfig>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl Web3NonceService for Web3NonceServiceImpl {
    #[tracing::instrument(level = "debug", skip_all, fields(%wallet_address))]
    async fn create_nonce(
        &self,
        wallet_address: EvmWalletAddress,
    ) -> Result<Web3AuthNonceEntity, CreateNonceError> {
        let created_at = self.time_source.now();
        let entity = Web3AuthNonceEntity {
            wallet_address,
            nonce: Web3AuthenticationNonce::new(),
            created_at,
            expires_at: created_at + self.config.nonce_ttl,
        };

        self.nonce_repo.set_nonce(&entity).await.int_err()?;

        Ok(entity)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(%wallet_address))]
    async fn consume_nonce(
        &self,
        wallet_address: &EvmWalletAddress,
        nonce: &Web3AuthenticationNonce,
    ) -> Result<(), ConsumeNonceError> {
        let now = self.time_source.now();

        self.nonce_repo
            .consume_nonce(wallet_address, nonce, now)
            .await
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn cleanup_expired_nonces(&self) -> Result<usize, InternalError> {
        let now = self.time_source.now();

        let removed = self
            .nonce_repo
            .cleanup_expired_nonces(now)
            .await
            .int_err()?;

        if removed > 0 {
            tracing::info!(removed, "Expired Web3 nonces cleaned up");
        }

        Ok(removed)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
