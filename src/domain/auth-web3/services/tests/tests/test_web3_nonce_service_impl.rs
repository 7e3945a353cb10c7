// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::Duration;
use lectern_auth_web3::*;
use lectern_auth_web3_inmem::InMemoryWeb3AuthNonceRepository;
use lectern_auth_web3_services::Web3NonceServiceImpl;
use pretty_assertions::assert_eq;
use time_source::{SystemTimeSource, SystemTimeSourceStub};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_create_nonce_sets_expiry() {
    let harness = Web3NonceServiceHarness::new();
    let wallet = wallet(1);

    let entity = harness.nonce_service.create_nonce(wallet).await.unwrap();

    assert_eq!(entity.wallet_address, wallet);
    assert_eq!(entity.created_at, harness.time_source.now());
    assert_eq!(
        entity.expires_at,
        entity.created_at + Duration::minutes(DEFAULT_NONCE_TTL_MINUTES)
    );
    assert_eq!(entity.nonce.as_ref().len(), WEB3_AUTH_NONCE_LENGTH);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_nonce_is_single_use() {
    let harness = Web3NonceServiceHarness::new();
    let wallet = wallet(1);

    let entity = harness.nonce_service.create_nonce(wallet).await.unwrap();

    assert_eq!(
        harness
            .nonce_service
            .consume_nonce(&wallet, &entity.nonce)
            .await,
        Ok(())
    );
    assert_eq!(
        harness
            .nonce_service
            .consume_nonce(&wallet, &entity.nonce)
            .await,
        Err(ConsumeNonceError::NotFound(NonceNotFoundError {
            wallet
        }))
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_concurrent_consumption_succeeds_once() {
    let harness = Web3NonceServiceHarness::new();
    let wallet = wallet(1);

    let entity = harness.nonce_service.create_nonce(wallet).await.unwrap();

    let (res_a, res_b) = tokio::join!(
        harness.nonce_service.consume_nonce(&wallet, &entity.nonce),
        harness.nonce_service.consume_nonce(&wallet, &entity.nonce),
    );

    let successes = [res_a, res_b].into_iter().filter(Result::is_ok).count();
    assert_eq!(successes, 1);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_expired_nonce_is_rejected() {
    let harness = Web3NonceServiceHarness::new();
    let wallet = wallet(1);

    let entity = harness.nonce_service.create_nonce(wallet).await.unwrap();

    harness
        .time_source
        .advance(Duration::minutes(DEFAULT_NONCE_TTL_MINUTES));

    assert!(matches!(
        harness
            .nonce_service
            .consume_nonce(&wallet, &entity.nonce)
            .await,
        Err(ConsumeNonceError::NotFound(_))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_nonce_is_bound_to_wallet() {
    let harness = Web3NonceServiceHarness::new();
    let owner = wallet(1);
    let stranger = wallet(2);

    let entity = harness.nonce_service.create_nonce(owner).await.unwrap();

    assert!(matches!(
        harness
            .nonce_service
            .consume_nonce(&stranger, &entity.nonce)
            .await,
        Err(ConsumeNonceError::NotFound(_))
    ));

    // The failed attempt must not burn the owner's challenge
    assert_eq!(
        harness
            .nonce_service
            .consume_nonce(&owner, &entity.nonce)
            .await,
        Ok(())
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_several_outstanding_nonces_per_wallet() {
    let harness = Web3NonceServiceHarness::new();
    let wallet = wallet(1);

    let first = harness.nonce_service.create_nonce(wallet).await.unwrap();
    let second = harness.nonce_service.create_nonce(wallet).await.unwrap();
    assert_ne!(first.nonce, second.nonce);

    assert_eq!(
        harness
            .nonce_service
            .consume_nonce(&wallet, &first.nonce)
            .await,
        Ok(())
    );
    assert_eq!(
        harness
            .nonce_service
            .consume_nonce(&wallet, &second.nonce)
            .await,
        Ok(())
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_cleanup_removes_only_expired_nonces() {
    let harness = Web3NonceServiceHarness::new();

    let stale = harness.nonce_service.create_nonce(wallet(1)).await.unwrap();

    harness.time_source.advance(Duration::minutes(6));
    let fresh = harness.nonce_service.create_nonce(wallet(2)).await.unwrap();

    harness.time_source.advance(Duration::minutes(5));

    assert_eq!(
        harness.nonce_service.cleanup_expired_nonces().await.unwrap(),
        1
    );
    assert!(
        harness
            .nonce_service
            .consume_nonce(&stale.wallet_address, &stale.nonce)
            .await
            .is_err()
    );
    assert_eq!(
        harness
            .nonce_service
            .consume_nonce(&fresh.wallet_address, &fresh.nonce)
            .await,
        Ok(())
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn wallet(seed: u8) -> EvmWalletAddress {
    EvmWalletAddress::repeat_byte(seed)
}

struct Web3NonceServiceHarness {
    nonce_service: Arc<dyn Web3NonceService>,
    time_source: SystemTimeSourceStub,
}

impl Web3NonceServiceHarness {
    fn new() -> Self {
        let time_source = SystemTimeSourceStub::new();

        let catalog = {
            let mut b = dill::CatalogBuilder::new();

            b.add::<Web3NonceServiceImpl>()
                .add::<InMemoryWeb3AuthNonceRepository>()
                .add_value(Web3AuthConfig::default())
                .add_value(time_source.clone())
                .bind::<dyn SystemTimeSource, SystemTimeSourceStub>();

            b.build()
        };

        Self {
            nonce_service: catalog.get_one().unwrap(),
            time_source,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
