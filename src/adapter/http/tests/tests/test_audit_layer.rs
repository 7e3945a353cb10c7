// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::Router;
use axum::routing::post;
use lectern_adapter_http::*;
use lectern_audit::{AuditAction, AuditHttpRequest};
use lectern_auth_web3::testing::TestWallet;
use pretty_assertions::assert_eq;

use crate::harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn audited_routes() -> Router {
    Router::new()
        .route(
            "/courses/{course_id}/progress",
            post(|| async { http::StatusCode::NO_CONTENT }).get(|| async { "progress" }),
        )
        .route(
            "/courses",
            post(|| async { http::StatusCode::UNPROCESSABLE_ENTITY }),
        )
        .layer(AuditLayer::new())
        .merge(auth_router())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_mutations_are_audited() {
    let harness = ServerHarness::new();
    let app = harness.app(audited_routes());

    let verify_request = harness
        .sign_in_request(&app, &TestWallet::from_seed(1))
        .await;
    let login = send(&app, post_json("/auth/verify", &verify_request)).await;
    let account_id: lectern_accounts::AccountID =
        serde_json::from_value(login.json()["account"]["id"].clone()).unwrap();
    let access_token = login.json()["accessToken"].as_str().unwrap().to_string();

    let response = send(
        &app,
        http::Request::post("/courses/intro-to-rust/progress")
            .header(http::header::AUTHORIZATION, format!("Bearer {access_token}"))
            .header("x-forwarded-for", "203.0.113.7")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status, http::StatusCode::NO_CONTENT);

    let rejected = send(&app, post_json("/courses", &serde_json::json!({}))).await;
    assert_eq!(rejected.status, http::StatusCode::UNPROCESSABLE_ENTITY);

    let mut mutations: Vec<_> = harness
        .drain_audit_events()
        .await
        .into_iter()
        .filter(|event| event.action == AuditAction::HttpMutation)
        .collect();
    mutations.sort_by_key(|event| event.http.as_ref().map(|http| http.path.clone()));

    assert_eq!(mutations.len(), 2);

    assert_eq!(mutations[0].account_id, None);
    assert_eq!(
        mutations[0].http,
        Some(AuditHttpRequest {
            method: "POST".to_string(),
            path: "/courses".to_string(),
            status: 422,
        })
    );

    assert_eq!(mutations[1].account_id, Some(account_id));
    assert_eq!(mutations[1].source_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(
        mutations[1].http,
        Some(AuditHttpRequest {
            method: "POST".to_string(),
            path: "/courses/intro-to-rust/progress".to_string(),
            status: 204,
        })
    );
}

#[test_log::test(tokio::test)]
async fn test_safe_requests_are_not_audited() {
    let harness = ServerHarness::new();
    let app = harness.app(audited_routes());

    let response = send(&app, get("/courses/intro-to-rust/progress")).await;
    assert_eq!(response.status, http::StatusCode::OK);

    let events = harness.drain_audit_events().await;
    assert!(events.is_empty(), "{events:?}");
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
