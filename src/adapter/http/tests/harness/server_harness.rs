// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::Router;
use axum::body::Body;
use bytes::Bytes;
use dill::{Catalog, CatalogBuilder};
use lectern_accounts::{AuthenticationService, JwtAuthenticationConfig, MockAuthenticationService};
use lectern_accounts_inmem::InMemoryAccountRepository;
use lectern_adapter_http::{AuthenticationLayer, CacheInvalidator};
use lectern_audit::{AuditConfig, AuditEvent, AuditEventRepository};
use lectern_audit_inmem::InMemoryAuditEventRepository;
use lectern_audit_services::AuditWorker;
use lectern_auth_web3::Web3AuthConfig;
use lectern_auth_web3::testing::{SiweMessageBuilder, TestWallet};
use lectern_auth_web3_inmem::InMemoryWeb3AuthNonceRepository;
use lectern_cache::{CacheConfig, CacheStore, MockCacheStore};
use lectern_cache_inmem::InMemoryCacheStore;
use time_source::{SystemTimeSource, SystemTimeSourceStub};
use tower::ServiceExt;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const TEST_JWT_SECRET: &str = "adapter-http-test-secret-long-enough-for-hs384";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub enum CacheBackend {
    Disabled,
    InMemory,
    Mock(MockCacheStore),
}

pub struct ServerHarness {
    catalog: Catalog,
    time_source: SystemTimeSourceStub,
}

impl ServerHarness {
    pub fn new() -> Self {
        Self::build(CacheBackend::InMemory, None)
    }

    pub fn with_cache_backend(cache_backend: CacheBackend) -> Self {
        Self::build(cache_backend, None)
    }

    pub fn with_authentication_service(authentication_service: MockAuthenticationService) -> Self {
        Self::build(CacheBackend::InMemory, Some(authentication_service))
    }

    fn build(
        cache_backend: CacheBackend,
        maybe_authentication_service: Option<MockAuthenticationService>,
    ) -> Self {
        let time_source = SystemTimeSourceStub::new();

        let catalog = {
            let mut b = CatalogBuilder::new();

            b.add_value(time_source.clone())
                .bind::<dyn SystemTimeSource, SystemTimeSourceStub>()
                .add_value(Web3AuthConfig::default())
                .add_value(JwtAuthenticationConfig::new(Some(TEST_JWT_SECRET.to_string())))
                .add_value(CacheConfig::default())
                .add_value(AuditConfig::default())
                .add::<InMemoryWeb3AuthNonceRepository>()
                .add::<InMemoryAccountRepository>()
                .add::<InMemoryAuditEventRepository>()
                .add::<CacheInvalidator>();

            lectern_auth_web3_services::register_dependencies(&mut b);
            lectern_cache_services::register_dependencies(&mut b);
            lectern_audit_services::register_dependencies(&mut b);

            if let Some(authentication_service) = maybe_authentication_service {
                b.add_value(authentication_service)
                    .bind::<dyn AuthenticationService, MockAuthenticationService>();
            } else {
                lectern_accounts_services::register_dependencies(&mut b);
            }

            match cache_backend {
                CacheBackend::Disabled => {}
                CacheBackend::InMemory => {
                    b.add::<InMemoryCacheStore>();
                }
                CacheBackend::Mock(store) => {
                    b.add_value(store).bind::<dyn CacheStore, MockCacheStore>();
                }
            }

            b.build()
        };

        Self {
            catalog,
            time_source,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn time_source(&self) -> &SystemTimeSourceStub {
        &self.time_source
    }

    /// Wraps test routes the way the server does: catalog extension outside,
    /// authentication right after it
    pub fn app(&self, routes: Router) -> Router {
        routes.layer(
            tower::ServiceBuilder::new()
                .layer(axum::Extension(self.catalog.clone()))
                .layer(AuthenticationLayer::new()),
        )
    }

    pub async fn sign_in_request(&self, app: &Router, wallet: &TestWallet) -> serde_json::Value {
        let nonce_response = send(
            app,
            post_json(
                "/auth/nonce",
                &serde_json::json!({
                    "walletAddress": wallet.address().to_string(),
                }),
            ),
        )
        .await;
        assert_eq!(nonce_response.status, http::StatusCode::OK);

        let nonce = nonce_response.json()["nonce"].as_str().unwrap().to_string();

        let message = SiweMessageBuilder::new(wallet.address(), nonce)
            .issued_at(self.time_source.now())
            .build();
        let signature = wallet.sign_message(&message);

        serde_json::json!({
            "message": message,
            "signature": signature,
        })
    }

    /// Completes the handshake and returns the access token
    pub async fn sign_in(&self, app: &Router, wallet: &TestWallet) -> String {
        let verify_request = self.sign_in_request(app, wallet).await;

        let response = send(app, post_json("/auth/verify", &verify_request)).await;
        assert_eq!(response.status, http::StatusCode::OK);

        response.json()["accessToken"].as_str().unwrap().to_string()
    }

    /// Lets the audit worker persist everything logged so far
    pub async fn drain_audit_events(&self) -> Vec<AuditEvent> {
        let worker = self.catalog.get_one::<AuditWorker>().unwrap();
        worker.run(std::future::ready(())).await.unwrap();

        let repo = self.catalog.get_one::<dyn AuditEventRepository>().unwrap();
        repo.list_recent_events(usize::MAX).await.unwrap()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct TestResponse {
    pub status: http::StatusCode,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

pub async fn send(app: &Router, request: http::Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();

    let (parts, body) = response.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    TestResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

pub fn get(uri: &str) -> http::Request<Body> {
    http::Request::get(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, access_token: &str) -> http::Request<Body> {
    http::Request::get(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> http::Request<Body> {
    http::Request::post(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Background cache writes are spawned tasks. On the current-thread test
/// runtime a few yields let them complete.
pub async fn settle_background_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
