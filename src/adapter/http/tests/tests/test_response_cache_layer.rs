// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get as route_get;
use internal_error::InternalError;
use lectern_adapter_http::*;
use lectern_auth_web3::testing::TestWallet;
use lectern_cache::MockCacheStore;
use pretty_assertions::assert_eq;

use crate::harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Default)]
struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn courses_routes(calls: &CallCounter, policy: ResponseCachePolicy) -> Router {
    let calls = calls.clone();

    Router::new()
        .route(
            "/courses",
            route_get(move || {
                let calls = calls.clone();
                async move {
                    let call = calls.hit();
                    (
                        [(http::header::CONTENT_TYPE, "application/json")],
                        format!(r#"{{"call":{call}}}"#),
                    )
                }
            }),
        )
        .layer(ResponseCacheLayer::new(policy))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_miss_then_hit() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(&calls, ResponseCachePolicy::list()));

    let first = send(&app, get("/courses")).await;
    assert_eq!(first.status, http::StatusCode::OK);
    assert_eq!(first.header("x-cache"), Some("MISS"));
    assert_eq!(first.text(), r#"{"call":1}"#);

    settle_background_tasks().await;

    let second = send(&app, get("/courses")).await;
    assert_eq!(second.status, http::StatusCode::OK);
    assert_eq!(second.header("x-cache"), Some("HIT"));
    assert_eq!(second.header("content-type"), Some("application/json"));
    assert_eq!(second.text(), r#"{"call":1}"#);

    assert_eq!(calls.count(), 1);
}

#[test_log::test(tokio::test)]
async fn test_query_order_does_not_matter() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(&calls, ResponseCachePolicy::list()));

    let first = send(&app, get("/courses?level=beginner&page=2")).await;
    assert_eq!(first.header("x-cache"), Some("MISS"));

    settle_background_tasks().await;

    let reordered = send(&app, get("/courses?page=2&level=beginner")).await;
    assert_eq!(reordered.header("x-cache"), Some("HIT"));

    let other_page = send(&app, get("/courses?page=3&level=beginner")).await;
    assert_eq!(other_page.header("x-cache"), Some("MISS"));

    assert_eq!(calls.count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_encoded_query_values_are_kept_apart() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(&calls, ResponseCachePolicy::list()));

    send(&app, get("/courses?a=1&b=2")).await;
    settle_background_tasks().await;

    let encoded = send(&app, get("/courses?a=1%26b%3D2")).await;
    assert_eq!(encoded.header("x-cache"), Some("MISS"));
    assert_eq!(encoded.text(), r#"{"call":2}"#);
}

#[test_log::test(tokio::test)]
async fn test_large_bodies_are_not_cached() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(
        &calls,
        ResponseCachePolicy::list().with_max_body_size(4),
    ));

    for expected_call in 1..=2 {
        let response = send(&app, get("/courses")).await;
        assert_eq!(response.status, http::StatusCode::OK);
        assert_eq!(response.header("x-cache"), Some("MISS"));
        assert_eq!(response.text(), format!(r#"{{"call":{expected_call}}}"#));

        settle_background_tasks().await;
    }

    assert_eq!(calls.count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_entry_expires_after_ttl() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(&calls, ResponseCachePolicy::list()));

    send(&app, get("/courses")).await;
    settle_background_tasks().await;

    harness.time_source().advance(chrono::Duration::seconds(299));
    assert_eq!(
        send(&app, get("/courses")).await.header("x-cache"),
        Some("HIT")
    );

    harness.time_source().advance(chrono::Duration::seconds(2));
    let after_expiry = send(&app, get("/courses")).await;
    assert_eq!(after_expiry.header("x-cache"), Some("MISS"));
    assert_eq!(after_expiry.text(), r#"{"call":2}"#);
}

#[test_log::test(tokio::test)]
async fn test_errors_and_no_store_are_not_cached() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();

    let routes = {
        let missing_calls = calls.clone();
        let private_calls = calls.clone();

        Router::new()
            .route(
                "/missing",
                route_get(move || {
                    let calls = missing_calls.clone();
                    async move {
                        calls.hit();
                        http::StatusCode::NOT_FOUND
                    }
                }),
            )
            .route(
                "/private",
                route_get(move || {
                    let calls = private_calls.clone();
                    async move {
                        calls.hit();
                        (
                            [(http::header::CACHE_CONTROL, "private, no-store")],
                            "secret",
                        )
                            .into_response()
                    }
                }),
            )
            .layer(ResponseCacheLayer::new(ResponseCachePolicy::list()))
    };
    let app = harness.app(routes);

    for uri in ["/missing", "/private", "/missing", "/private"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.header("x-cache"), Some("MISS"));
        settle_background_tasks().await;
    }

    assert_eq!(calls.count(), 4);
}

#[test_log::test(tokio::test)]
async fn test_per_user_entries_are_separate() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();

    let progress_calls = calls.clone();
    let routes = Router::new()
        .route(
            "/me/progress",
            route_get(
                move |axum::Extension(subject): axum::Extension<lectern_accounts::CurrentAccountSubject>| {
                    let calls = progress_calls.clone();
                    async move {
                        calls.hit();
                        subject
                            .account_id()
                            .map(ToString::to_string)
                            .unwrap_or_default()
                    }
                },
            ),
        )
        .layer(ResponseCacheLayer::new(ResponseCachePolicy::per_user()))
        .merge(auth_router());
    let app = harness.app(routes);

    let alice = harness.sign_in(&app, &TestWallet::from_seed(1)).await;
    let bob = harness.sign_in(&app, &TestWallet::from_seed(2)).await;

    let alice_first = send(&app, get_with_token("/me/progress", &alice)).await;
    settle_background_tasks().await;
    let bob_first = send(&app, get_with_token("/me/progress", &bob)).await;
    settle_background_tasks().await;

    assert_eq!(alice_first.header("x-cache"), Some("MISS"));
    assert_eq!(bob_first.header("x-cache"), Some("MISS"));
    assert_ne!(alice_first.text(), bob_first.text());

    let alice_second = send(&app, get_with_token("/me/progress", &alice)).await;
    assert_eq!(alice_second.header("x-cache"), Some("HIT"));
    assert_eq!(alice_second.text(), alice_first.text());

    assert_eq!(calls.count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_unreachable_cache_still_serves() {
    let mut store = MockCacheStore::new();
    store
        .expect_get()
        .returning(|_| Err(InternalError::new("connection refused").into()));
    store
        .expect_set()
        .returning(|_, _, _| Err(InternalError::new("connection refused").into()));

    let harness = ServerHarness::with_cache_backend(CacheBackend::Mock(store));
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(&calls, ResponseCachePolicy::list()));

    for _ in 0..2 {
        let response = send(&app, get("/courses")).await;
        assert_eq!(response.status, http::StatusCode::OK);
        assert_eq!(response.header("x-cache"), Some("MISS"));
        settle_background_tasks().await;
    }

    assert_eq!(calls.count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_disabled_cache_is_transparent() {
    let harness = ServerHarness::with_cache_backend(CacheBackend::Disabled);
    let calls = CallCounter::default();
    let app = harness.app(courses_routes(&calls, ResponseCachePolicy::list()));

    for _ in 0..2 {
        let response = send(&app, get("/courses")).await;
        assert_eq!(response.status, http::StatusCode::OK);
        assert_eq!(response.header("x-cache"), None);
    }

    assert_eq!(calls.count(), 2);
}

#[test_log::test(tokio::test)]
async fn test_successful_mutation_invalidates() {
    let harness = ServerHarness::new();
    let calls = CallCounter::default();

    let routes = {
        let list_calls = calls.clone();

        Router::new()
            .route(
                "/courses",
                route_get(move || {
                    let calls = list_calls.clone();
                    async move { format!("call {}", calls.hit()) }
                })
                .post(|| async { http::StatusCode::CREATED })
                .put(|| async { http::StatusCode::CONFLICT }),
            )
            .layer(ResponseCacheLayer::new(ResponseCachePolicy::list()))
            .layer(CacheInvalidationLayer::new(["cache:GET:/courses*"]))
    };
    let app = harness.app(routes);

    send(&app, get("/courses")).await;
    settle_background_tasks().await;
    assert_eq!(
        send(&app, get("/courses")).await.header("x-cache"),
        Some("HIT")
    );

    // Rejected mutations leave the cache alone
    let conflict = send(&app, http::Request::put("/courses").body(axum::body::Body::empty()).unwrap()).await;
    assert_eq!(conflict.status, http::StatusCode::CONFLICT);
    assert_eq!(
        send(&app, get("/courses")).await.header("x-cache"),
        Some("HIT")
    );

    let created = send(&app, http::Request::post("/courses").body(axum::body::Body::empty()).unwrap()).await;
    assert_eq!(created.status, http::StatusCode::CREATED);
    assert_eq!(created.header("x-cache"), None);

    let after = send(&app, get("/courses")).await;
    assert_eq!(after.header("x-cache"), Some("MISS"));
    assert_eq!(after.text(), "call 2");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
