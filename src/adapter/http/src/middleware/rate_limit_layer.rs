// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::response::{IntoResponse, Response};
use futures::Future;
use http::{HeaderMap, HeaderName, HeaderValue};
use http_common::ApiError;
use lectern_accounts::CurrentAccountSubject;
use lectern_cache::{CacheKeyTtl, CacheService};
use time_source::SystemTimeSource;
use tower::{Layer, Service};

use crate::axum_utils::*;
use crate::resolve_source_address;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const X_RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

const DEFAULT_RATE_LIMIT_KEY_PREFIX: &str = "default";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type RateLimitScopeResolver = Arc<dyn Fn(&http::Request<Body>) -> String + Send + Sync>;
pub type RateLimitSkipPredicate = Arc<dyn Fn(&http::Request<Body>) -> bool + Send + Sync>;

/// Who shares one counter
#[derive(Clone, Default)]
pub enum RateLimitScope {
    #[default]
    SourceAddress,
    /// Logged-in account, or the source address for anonymous requests
    Account,
    Custom(RateLimitScopeResolver),
}

impl RateLimitScope {
    fn resolve(&self, request: &http::Request<Body>) -> String {
        let source_address = || resolve_source_address(request.headers(), request.extensions());

        match self {
            Self::SourceAddress => source_address(),
            Self::Account => match request.extensions().get::<CurrentAccountSubject>() {
                Some(CurrentAccountSubject::Logged(logged)) => {
                    format!("account:{}", logged.account_id)
                }
                Some(CurrentAccountSubject::Anonymous(_)) | None => source_address(),
            },
            Self::Custom(resolver) => resolver(request),
        }
    }
}

impl fmt::Debug for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceAddress => write!(f, "SourceAddress"),
            Self::Account => write!(f, "Account"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Fixed-window quota: at most `limit` requests per scope within `window`
/// counted from the first request of the window
#[derive(Clone)]
pub struct RateLimitPolicy {
    pub limit: u64,
    pub window: Duration,
    pub key_prefix: String,
    pub scope: RateLimitScope,
    /// Whether each route gets its own counter
    pub per_route: bool,
    skip: Option<RateLimitSkipPredicate>,
}

impl RateLimitPolicy {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            key_prefix: DEFAULT_RATE_LIMIT_KEY_PREFIX.to_string(),
            scope: RateLimitScope::default(),
            per_route: true,
            skip: None,
        }
    }

    /// Sensitive operations
    pub fn strict() -> Self {
        Self::new(5, Duration::from_secs(5 * 60)).with_key_prefix("strict")
    }

    /// Sign-in handshake
    pub fn auth() -> Self {
        Self::new(10, Duration::from_secs(15 * 60)).with_key_prefix("auth")
    }

    pub fn per_user(limit: u64, window: Duration) -> Self {
        Self::new(limit, window)
            .with_key_prefix("user")
            .with_scope(RateLimitScope::Account)
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn with_scope(mut self, scope: RateLimitScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_per_route(mut self, per_route: bool) -> Self {
        self.per_route = per_route;
        self
    }

    /// Requests matching `skip` are neither counted nor limited
    pub fn with_skip(
        mut self,
        skip: impl Fn(&http::Request<Body>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// `ratelimit:{prefix}:{route}:{scope}`, where the route is the matched
    /// route template (or the raw path outside a router). A custom scope
    /// resolver owns everything after the prefix.
    pub fn counter_key(&self, request: &http::Request<Body>) -> String {
        let scope = self.scope.resolve(request);

        if !self.per_route || matches!(self.scope, RateLimitScope::Custom(_)) {
            return format!("ratelimit:{}:{scope}", self.key_prefix);
        }

        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map_or_else(|| request.uri().path(), MatchedPath::as_str);

        format!("ratelimit:{}:{route}:{scope}", self.key_prefix)
    }

    fn should_skip(&self, request: &http::Request<Body>) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(request))
    }
}

impl fmt::Debug for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitPolicy")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("key_prefix", &self.key_prefix)
            .field("scope", &self.scope)
            .field("per_route", &self.per_route)
            .field("has_skip", &self.skip.is_some())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Counts requests through the cache store and rejects those above the quota
/// with `429 Too Many Requests`.
///
/// The counter store is optional infrastructure: when it is missing or
/// failing, requests pass through unlimited and without quota headers.
#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    policy: Arc<RateLimitPolicy>,
}

impl RateLimitLayer {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<Svc> Layer<Svc> for RateLimitLayer {
    type Service = RateLimitMiddleware<Svc>;

    fn layer(&self, inner: Svc) -> Self::Service {
        RateLimitMiddleware {
            inner,
            policy: self.policy.clone(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct RateLimitMiddleware<Svc> {
    inner: Svc,
    policy: Arc<RateLimitPolicy>,
}

struct QuotaState {
    limit: u64,
    remaining: u64,
    reset_at_unix_seconds: i64,
}

impl QuotaState {
    fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATE_LIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATE_LIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(
            X_RATE_LIMIT_RESET,
            HeaderValue::from(self.reset_at_unix_seconds),
        );
    }
}

fn whole_seconds_ceil(duration: Duration) -> u64 {
    let seconds = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        seconds + 1
    } else {
        seconds
    }
}

impl<Svc> Service<http::Request<Body>> for RateLimitMiddleware<Svc>
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
        let policy = self.policy.clone();

        Box::pin(async move {
            if policy.should_skip(&request) {
                return inner.call(request).await;
            }

            let catalog = catalog_of(&request);
            let cache_service = catalog.get_one::<dyn CacheService>().unwrap();
            let time_source = catalog.get_one::<dyn SystemTimeSource>().unwrap();

            let key = policy.counter_key(&request);

            let Some(count) = cache_service.increment(&key, policy.window).await else {
                tracing::warn!(key, "Rate limit counter unavailable, letting request through");
                return inner.call(request).await;
            };

            let window_seconds = whole_seconds_ceil(policy.window);
            let quota = QuotaState {
                limit: policy.limit,
                remaining: policy.limit.saturating_sub(count),
                reset_at_unix_seconds: time_source.now().timestamp()
                    + i64::try_from(window_seconds).unwrap_or(i64::MAX),
            };

            if count > policy.limit {
                let retry_after_seconds = match cache_service.ttl(&key).await {
                    Some(CacheKeyTtl::Expires(remaining)) => whole_seconds_ceil(remaining).max(1),
                    _ => window_seconds,
                };

                tracing::warn!(
                    key,
                    count,
                    limit = policy.limit,
                    retry_after_seconds,
                    "Rate limit exceeded"
                );

                let mut response = ApiError::too_many_requests().into_response();
                quota.apply(response.headers_mut());
                response
                    .headers_mut()
                    .insert(http::header::RETRY_AFTER, HeaderValue::from(retry_after_seconds));

                return Ok(response);
            }

            let mut response = inner.call(request).await?;
            quota.apply(response.headers_mut());

            Ok(response)
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
