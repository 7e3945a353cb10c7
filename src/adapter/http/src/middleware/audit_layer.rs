// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::Response;
use futures::Future;
use lectern_accounts::CurrentAccountSubject;
use lectern_audit::{AuditAction, AuditEvent, AuditLogger};
use time_source::SystemTimeSource;
use tower::{Layer, Service};

use crate::axum_utils::*;
use crate::resolve_source_address;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Records an [`AuditAction::HttpMutation`] event for every non-safe request
/// once its response is known. Recording never delays or fails the request.
#[derive(Debug, Clone, Default)]
pub struct AuditLayer {}

impl AuditLayer {
    pub fn new() -> Self {
        Self {}
    }
}

impl<Svc> Layer<Svc> for AuditLayer {
    type Service = AuditMiddleware<Svc>;

    fn layer(&self, inner: Svc) -> Self::Service {
        AuditMiddleware { inner }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct AuditMiddleware<Svc> {
    inner: Svc,
}

impl<Svc> Service<http::Request<Body>> for AuditMiddleware<Svc>
where
    Svc: Service<http::Request<Body>, Response = Response> + Send + Clone + 'static,
    Svc::Future: Send + 'static,
{
    type Response = Svc::Response;
    type Error = Svc::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if request.method().is_safe() {
                return inner.call(request).await;
            }

            let catalog = catalog_of(&request);
            let method = request.method().to_string();
            let path = request.uri().path().to_string();
            let source_address = resolve_source_address(request.headers(), request.extensions());
            let maybe_account_id = request
                .extensions()
                .get::<CurrentAccountSubject>()
                .and_then(CurrentAccountSubject::account_id)
                .copied();

            let response = inner.call(request).await?;

            let time_source = catalog.get_one::<dyn SystemTimeSource>().unwrap();
            let audit_logger = catalog.get_one::<dyn AuditLogger>().unwrap();

            audit_logger.log(
                AuditEvent::new(AuditAction::HttpMutation, time_source.now())
                    .with_maybe_account_id(maybe_account_id)
                    .with_source_address(source_address)
                    .with_http_request(method, path, response.status().as_u16()),
            );

            Ok(response)
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
