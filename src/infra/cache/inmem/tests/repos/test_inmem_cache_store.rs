// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use dill::{Catalog, CatalogBuilder};
use lectern_cache::{CacheKeyTtl, CacheStore};
use lectern_cache_inmem::InMemoryCacheStore;
use pretty_assertions::assert_eq;
use time_source::{SystemTimeSource, SystemTimeSourceStub};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_get_missing_key() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_get_missing_key(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_set_get_overwrite() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_set_get_overwrite(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_delete() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_delete(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_delete_pattern() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_delete_pattern(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_increment_sets_ttl_once() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_increment_sets_ttl_once(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_increment_non_counter() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_increment_non_counter(&harness.catalog).await;
}

#[test_log::test(tokio::test)]
async fn test_ttl_states() {
    let harness = InMemoryCacheStoreHarness::new();
    lectern_cache_repo_tests::test_ttl_states(&harness.catalog).await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_entry_expires_after_ttl() {
    let harness = InMemoryCacheStoreHarness::new();
    let store = harness.catalog.get_one::<dyn CacheStore>().unwrap();

    store
        .set("courses:list", "[]", Some(Duration::from_secs(300)))
        .await
        .unwrap();

    harness.time_source.advance(chrono::Duration::seconds(299));
    assert_eq!(
        store.get("courses:list").await.unwrap(),
        Some("[]".to_string())
    );
    assert_eq!(
        store.ttl("courses:list").await.unwrap(),
        CacheKeyTtl::Expires(Duration::from_secs(1))
    );

    harness.time_source.advance(chrono::Duration::seconds(1));
    assert_eq!(store.get("courses:list").await.unwrap(), None);
    assert_eq!(
        store.ttl("courses:list").await.unwrap(),
        CacheKeyTtl::Missing
    );
}

#[test_log::test(tokio::test)]
async fn test_counter_restarts_after_window() {
    let harness = InMemoryCacheStoreHarness::new();
    let store = harness.catalog.get_one::<dyn CacheStore>().unwrap();
    let window = Duration::from_secs(60);

    for expected in 1..=3 {
        assert_eq!(store.increment("ratelimit:api:x", window).await.unwrap(), expected);
        harness.time_source.advance(chrono::Duration::seconds(10));
    }

    // The window was fixed by the first increment, later ones did not extend it
    harness.time_source.advance(chrono::Duration::seconds(30));
    assert_eq!(store.increment("ratelimit:api:x", window).await.unwrap(), 1);
}

#[test_log::test(tokio::test)]
async fn test_delete_pattern_rejects_malformed_glob() {
    let harness = InMemoryCacheStoreHarness::new();
    let store = harness.catalog.get_one::<dyn CacheStore>().unwrap();

    assert!(matches!(
        store.delete_pattern("user:[").await,
        Err(lectern_cache::CacheStoreError::InvalidPattern(_))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct InMemoryCacheStoreHarness {
    catalog: Catalog,
    time_source: SystemTimeSourceStub,
}

impl InMemoryCacheStoreHarness {
    pub fn new() -> Self {
        let time_source = SystemTimeSourceStub::new();

        let mut catalog_builder = CatalogBuilder::new();
        catalog_builder
            .add::<InMemoryCacheStore>()
            .add_value(time_source.clone())
            .bind::<dyn SystemTimeSource, SystemTimeSourceStub>();

        Self {
            catalog: catalog_builder.build(),
            time_source,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
