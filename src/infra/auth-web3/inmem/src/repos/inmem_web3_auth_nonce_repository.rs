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

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryWeb3AuthNonceRepository {
    state: Arc<Mutex<State>>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Default)]
struct State {
    nonces: HashMap<(EvmWalletAddress, Web3AuthenticationNonce), Web3AuthNonceEntity>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[component(pub)]
#[interface(dyn Web3AuthNonceRepository)]
#[scope(Singleton)]
impl InMemoryWeb3AuthNonceRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl Web3AuthNonceRepository for InMemoryWeb3AuthNonceRepository {
    async fn set_nonce(&self, entity: &Web3AuthNonceEntity) -> Result<(), SetNonceError> {
        let mut guard = self.state.lock().unwrap();

        guard.nonces.insert(
            (entity.wallet_address, entity.nonce.clone()),
            entity.clone(),
        );

        Ok(())
    }

    async fn consume_nonce(
        &self,
        wallet: &EvmWalletAddress,
        nonce: &Web3AuthenticationNonce,
        now: DateTime<Utc>,
    ) -> Result<(), ConsumeNonceError> {
        let mut guard = self.state.lock().unwrap();

        let key = (*wallet, nonce.clone());
        let is_consumable = guard
            .nonces
            .get(&key)
            .is_some_and(|entity| !entity.is_expired_at(now));

        if is_consumable {
            guard.nonces.remove(&key);
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
        let mut guard = self.state.lock().unwrap();

        let count_before = guard.nonces.len();
        guard.nonces.retain(|_, entity| !entity.is_expired_at(now));

        Ok(count_before - guard.nonces.len())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
