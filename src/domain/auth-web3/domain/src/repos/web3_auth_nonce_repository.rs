// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Utc};
use internal_error::InternalError;
use thiserror::Error;

use crate::{EvmWalletAddress, Web3AuthNonceEntity, Web3AuthenticationNonce};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait Web3AuthNonceRepository: Send + Sync {
    /// Stores a new challenge. Several challenges may coexist for one wallet.
    async fn set_nonce(&self, entity: &Web3AuthNonceEntity) -> Result<(), SetNonceError>;

    /// Removes the challenge matching both `wallet` and `nonce` if it has not
    /// expired at `now`. Lookup and removal happen as one atomic step, so of
    /// two concurrent callers at most one observes success.
    async fn consume_nonce(
        &self,
        wallet: &EvmWalletAddress,
        nonce: &Web3AuthenticationNonce,
        now: DateTime<Utc>,
    ) -> Result<(), ConsumeNonceError>;

    /// Returns the number of removed challenges
    async fn cleanup_expired_nonces(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, CleanupExpiredNoncesError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum SetNonceError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl PartialEq for SetNonceError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Internal(a), Self::Internal(b)) => a.reason().eq(&b.reason()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum ConsumeNonceError {
    #[error(transparent)]
    NotFound(#[from] NonceNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl PartialEq for ConsumeNonceError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Internal(a), Self::Internal(b)) => a.reason().eq(&b.reason()),
            (_, _) => false,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("No valid nonce found for wallet: {wallet}")]
pub struct NonceNotFoundError {
    pub wallet: EvmWalletAddress,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum CleanupExpiredNoncesError {
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl PartialEq for CleanupExpiredNoncesError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Internal(a), Self::Internal(b)) => a.reason().eq(&b.reason()),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
