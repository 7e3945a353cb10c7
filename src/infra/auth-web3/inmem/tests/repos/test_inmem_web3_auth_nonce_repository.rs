// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use dill::{Catalog, CatalogBuilder};
use lectern_auth_web3_inmem::InMemoryWeb3AuthNonceRepository;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_set_and_consume_nonce() {
    let harness = InMemoryWeb3AuthNonceRepositoryHarness::new();
    lectern_auth_web3_repo_tests::test_set_and_consume_nonce(&harness.catalog).await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_consume_missing_nonce() {
    let harness = InMemoryWeb3AuthNonceRepositoryHarness::new();
    lectern_auth_web3_repo_tests::test_consume_missing_nonce(&harness.catalog).await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_consume_expired_nonce() {
    let harness = InMemoryWeb3AuthNonceRepositoryHarness::new();
    lectern_auth_web3_repo_tests::test_consume_expired_nonce(&harness.catalog).await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_nonces_of_different_wallets_are_isolated() {
    let harness = InMemoryWeb3AuthNonceRepositoryHarness::new();
    lectern_auth_web3_repo_tests::test_nonces_of_different_wallets_are_isolated(&harness.catalog)
        .await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_cleanup_expired_nonces() {
    let harness = InMemoryWeb3AuthNonceRepositoryHarness::new();
    lectern_auth_web3_repo_tests::test_cleanup_expired_nonces(&harness.catalog).await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct InMemoryWeb3AuthNonceRepositoryHarness {
    catalog: Catalog,
}

impl InMemoryWeb3AuthNonceRepositoryHarness {
    pub fn new() -> Self {
        let mut catalog_builder = CatalogBuilder::new();
        catalog_builder.add::<InMemoryWeb3AuthNonceRepository>();

        Self {
            catalog: catalog_builder.build(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
