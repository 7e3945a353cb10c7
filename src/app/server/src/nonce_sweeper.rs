// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::time::Duration;

use internal_error::InternalError;
use lectern_auth_web3::Web3NonceService;
use tokio::time::MissedTickBehavior;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Periodically removes sign-in nonces that expired without being consumed
#[dill::component(pub)]
pub struct NonceSweeper {
    nonce_service: Arc<dyn Web3NonceService>,
}

impl NonceSweeper {
    pub async fn sweep_once(&self) -> Result<usize, InternalError> {
        self.nonce_service.cleanup_expired_nonces().await
    }

    /// First sweep happens right away, then once per `interval` until
    /// `shutdown` resolves
    pub async fn run(&self, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.sweep_once().await {
                        tracing::error!(error = ?err, error_msg = %err, "Nonce sweep failed");
                    }
                }
            }
        }

        tracing::debug!("Nonce sweeper stopped");
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
