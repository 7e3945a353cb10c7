// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use dill::Catalog;
use lectern_cache::*;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const HOUR: Duration = Duration::from_secs(3600);

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_get_missing_key(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    assert_eq!(store.get("courses:list").await.unwrap(), None);
    assert!(!store.exists("courses:list").await.unwrap());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_set_get_overwrite(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    store.set("course:1", r#"{"id":1}"#, Some(HOUR)).await.unwrap();
    assert_eq!(
        store.get("course:1").await.unwrap(),
        Some(r#"{"id":1}"#.to_string())
    );

    store.set("course:1", r#"{"id":1,"v":2}"#, None).await.unwrap();
    assert_eq!(
        store.get("course:1").await.unwrap(),
        Some(r#"{"id":1,"v":2}"#.to_string())
    );

    // A stored empty string is a hit, not a miss
    store.set("course:2", "", None).await.unwrap();
    assert_eq!(store.get("course:2").await.unwrap(), Some(String::new()));
    assert!(store.exists("course:2").await.unwrap());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_delete(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    store.set("course:1", "a", None).await.unwrap();

    assert!(store.delete("course:1").await.unwrap());
    assert!(!store.delete("course:1").await.unwrap());
    assert_eq!(store.get("course:1").await.unwrap(), None);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_delete_pattern(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    for key in [
        "user:42:profile",
        "user:42:courses",
        "user:420:profile",
        "user:7:profile",
        "course:42",
    ] {
        store.set(key, "v", Some(HOUR)).await.unwrap();
    }

    assert_eq!(store.delete_pattern("user:42:*").await.unwrap(), 2);

    assert_eq!(store.get("user:42:profile").await.unwrap(), None);
    assert_eq!(store.get("user:42:courses").await.unwrap(), None);
    assert!(store.exists("user:420:profile").await.unwrap());
    assert!(store.exists("user:7:profile").await.unwrap());
    assert!(store.exists("course:42").await.unwrap());

    assert_eq!(store.delete_pattern("nothing:*").await.unwrap(), 0);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_increment_sets_ttl_once(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    let window = Duration::from_secs(60);

    assert_eq!(store.increment("ratelimit:api:1.2.3.4", window).await.unwrap(), 1);
    let ttl_after_first = store.ttl("ratelimit:api:1.2.3.4").await.unwrap();

    assert_eq!(store.increment("ratelimit:api:1.2.3.4", window).await.unwrap(), 2);
    assert_eq!(store.increment("ratelimit:api:1.2.3.4", HOUR).await.unwrap(), 3);
    let ttl_after_third = store.ttl("ratelimit:api:1.2.3.4").await.unwrap();

    let (CacheKeyTtl::Expires(first), CacheKeyTtl::Expires(third)) =
        (ttl_after_first, ttl_after_third)
    else {
        panic!("Counter must expire, got {ttl_after_first:?} and {ttl_after_third:?}");
    };
    assert!(first <= window);
    assert!(third <= first);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_increment_non_counter(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    store.set("course:1", "not a number", None).await.unwrap();

    assert!(
        store
            .increment("course:1", Duration::from_secs(60))
            .await
            .is_err()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_ttl_states(catalog: &Catalog) {
    let store = catalog.get_one::<dyn CacheStore>().unwrap();

    store.set("persistent", "v", None).await.unwrap();
    store.set("volatile", "v", Some(HOUR)).await.unwrap();

    assert_eq!(store.ttl("absent").await.unwrap(), CacheKeyTtl::Missing);
    assert_eq!(
        store.ttl("persistent").await.unwrap(),
        CacheKeyTtl::NoExpiry
    );
    assert!(matches!(
        store.ttl("volatile").await.unwrap(),
        CacheKeyTtl::Expires(remaining) if remaining <= HOUR && remaining > HOUR / 2
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
