// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::Response;
use futures::Future;
use lectern_cache::CacheService;
use tower::{Layer, Service};

use crate::axum_utils::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[dill::component(pub)]
pub struct CacheInvalidator {
    cache_service: Arc<dyn CacheService>,
}

impl CacheInvalidator {
    /// Deletes every key matching any of the glob patterns and returns the
    /// total number of removed keys
    pub async fn invalidate<S: AsRef<str> + Sync>(&self, patterns: &[S]) -> usize {
        let mut removed = 0;
        for pattern in patterns {
            removed += self.cache_service.delete_pattern(pattern.as_ref()).await;
        }

        tracing::debug!(
            patterns = ?patterns.iter().map(|p| p.as_ref()).collect::<Vec<&str>>(),
            removed,
            "Invalidated cached responses"
        );

        removed
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Drops cached responses after every successful non-safe request that passes
/// through this layer.
///
/// Patterns are matched as globs against cache keys, e.g.
/// `cache:GET:/courses*`. Invalidation completes before the response is
/// returned, so the client never reads its own stale data.
#[derive(Debug, Clone)]
pub struct CacheInvalidationLayer {
    patterns: Arc<Vec<String>>,
}

impl CacheInvalidationLayer {
    pub fn new<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self {
            patterns: Arc::new(patterns.into_iter().map(Into::into).collect()),
        }
    }
}

impl<Svc> Layer<Svc> for CacheInvalidationLayer {
    type Service = CacheInvalidationMiddleware<Svc>;

    fn layer(&self, inner: Svc) -> Self::Service {
        CacheInvalidationMiddleware {
            inner,
            patterns: self.patterns.clone(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct CacheInvalidationMiddleware<Svc> {
    inner: Svc,
    patterns: Arc<Vec<String>>,
}

impl<Svc> Service<http::Request<Body>> for CacheInvalidationMiddleware<Svc>
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
        let patterns = self.patterns.clone();

        Box::pin(async move {
            if request.method().is_safe() {
                return inner.call(request).await;
            }

            let catalog = catalog_of(&request);

            let response = inner.call(request).await?;

            if response.status().is_success() {
                let invalidator = catalog.get_one::<CacheInvalidator>().unwrap();
                invalidator.invalidate(patterns.as_slice()).await;
            }

            Ok(response)
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
