// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;
use dill::Catalog;
use internal_error::{InternalError, ResultIntoInternal};
use lectern_adapter_http::{
    AuditLayer,
    AuthenticationLayer,
    RateLimitLayer,
    RateLimitPolicy,
    auth_router,
};
use tokio::net::TcpListener;

use crate::config::HttpConfig;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const HEALTH_PATH: &str = "/health";

const GLOBAL_RATE_LIMIT_KEY_PREFIX: &str = "global";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn build_router(catalog: Catalog, http_config: &HttpConfig) -> Router {
    let mut routes = Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .merge(auth_router())
        .layer(AuditLayer::new());

    if let Some(rate_limit) = &http_config.rate_limit {
        routes = routes.layer(RateLimitLayer::new(
            RateLimitPolicy::new(rate_limit.limit, rate_limit.window.into())
                .with_key_prefix(GLOBAL_RATE_LIMIT_KEY_PREFIX)
                .with_per_route(false)
                .with_skip(|request| request.uri().path() == HEALTH_PATH),
        ));
    }

    routes
        .fallback(observability::axum::unknown_fallback_handler)
        .layer(
            tower::ServiceBuilder::new()
                .layer(observability::axum::http_layer())
                .layer(axum::Extension(catalog))
                .layer(AuthenticationLayer::new()),
        )
}

async fn health_handler() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    pub async fn bind(catalog: Catalog, http_config: &HttpConfig) -> Result<Self, InternalError> {
        let address = SocketAddr::new(http_config.address, http_config.port);
        let listener = TcpListener::bind(address).await.int_err()?;

        Ok(Self {
            listener,
            router: build_router(catalog, http_config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, InternalError> {
        self.listener.local_addr().int_err()
    }

    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), InternalError> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .int_err()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
