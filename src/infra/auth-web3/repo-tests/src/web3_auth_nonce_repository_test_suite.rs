// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use dill::Catalog;
use lectern_auth_web3::*;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_set_and_consume_nonce(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn Web3AuthNonceRepository>().unwrap();

    let now = now();
    let entity = make_nonce(wallet(1), now);

    assert_eq!(repo.set_nonce(&entity).await, Ok(()));

    assert_eq!(
        repo.consume_nonce(&entity.wallet_address, &entity.nonce, now)
            .await,
        Ok(())
    );
    assert_eq!(
        repo.consume_nonce(&entity.wallet_address, &entity.nonce, now)
            .await,
        Err(ConsumeNonceError::NotFound(NonceNotFoundError {
            wallet: entity.wallet_address
        }))
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_consume_missing_nonce(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn Web3AuthNonceRepository>().unwrap();

    let now = now();
    let stored = make_nonce(wallet(1), now);
    repo.set_nonce(&stored).await.unwrap();

    let unknown_nonce = Web3AuthenticationNonce::new();

    assert_eq!(
        repo.consume_nonce(&stored.wallet_address, &unknown_nonce, now)
            .await,
        Err(ConsumeNonceError::NotFound(NonceNotFoundError {
            wallet: stored.wallet_address
        }))
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_consume_expired_nonce(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn Web3AuthNonceRepository>().unwrap();

    let now = now();
    let entity = make_nonce(wallet(1), now);
    repo.set_nonce(&entity).await.unwrap();

    // Expiry is inclusive: at `expires_at` the nonce is already unusable
    assert!(matches!(
        repo.consume_nonce(&entity.wallet_address, &entity.nonce, entity.expires_at)
            .await,
        Err(ConsumeNonceError::NotFound(_))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_nonces_of_different_wallets_are_isolated(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn Web3AuthNonceRepository>().unwrap();

    let now = now();
    let entity_a = make_nonce(wallet(1), now);
    let entity_b = make_nonce(wallet(2), now);

    repo.set_nonce(&entity_a).await.unwrap();
    repo.set_nonce(&entity_b).await.unwrap();

    assert!(matches!(
        repo.consume_nonce(&entity_b.wallet_address, &entity_a.nonce, now)
            .await,
        Err(ConsumeNonceError::NotFound(_))
    ));

    assert_eq!(
        repo.consume_nonce(&entity_a.wallet_address, &entity_a.nonce, now)
            .await,
        Ok(())
    );
    assert_eq!(
        repo.consume_nonce(&entity_b.wallet_address, &entity_b.nonce, now)
            .await,
        Ok(())
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_cleanup_expired_nonces(catalog: &Catalog) {
    let repo = catalog.get_one::<dyn Web3AuthNonceRepository>().unwrap();

    let t0 = now();
    let old = make_nonce(wallet(1), t0);
    let older = make_nonce(wallet(2), t0 - Duration::minutes(1));
    let fresh = make_nonce(wallet(3), t0 + Duration::minutes(5));

    for entity in [&old, &older, &fresh] {
        repo.set_nonce(entity).await.unwrap();
    }

    let later = old.expires_at + Duration::seconds(1);

    assert_eq!(repo.cleanup_expired_nonces(later).await, Ok(2));
    assert_eq!(repo.cleanup_expired_nonces(later).await, Ok(0));

    assert_eq!(
        repo.consume_nonce(&fresh.wallet_address, &fresh.nonce, later)
            .await,
        Ok(())
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Helpers
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn wallet(seed: u8) -> EvmWalletAddress {
    EvmWalletAddress::repeat_byte(seed)
}

fn make_nonce(wallet_address: EvmWalletAddress, created_at: DateTime<Utc>) -> Web3AuthNonceEntity {
    Web3AuthNonceEntity {
        wallet_address,
        nonce: Web3AuthenticationNonce::new(),
        created_at,
        expires_at: created_at + Duration::minutes(DEFAULT_NONCE_TTL_MINUTES),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
