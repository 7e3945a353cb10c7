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
use axum::response::Response;
use futures::Future;
use http::{HeaderName, HeaderValue};
use lectern_accounts::CurrentAccountSubject;
use lectern_cache::{CacheService, CacheServiceJsonExt};
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};

use crate::axum_utils::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

const X_CACHE_HIT: &str = "HIT";
const X_CACHE_MISS: &str = "MISS";

const DEFAULT_RESPONSE_CACHE_KEY_PREFIX: &str = "cache";

/// Larger bodies are passed through without being stored
pub const DEFAULT_MAX_CACHEABLE_BODY_SIZE: usize = 1024 * 1024;

// Headers that describe the connection or the body encoding of one
// particular response rather than the resource
fn is_replayable_header(name: &HeaderName) -> bool {
    !(*name == http::header::CONNECTION
        || *name == http::header::CONTENT_LENGTH
        || *name == http::header::SET_COOKIE
        || *name == http::header::TRANSFER_ENCODING
        || *name == X_CACHE)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type ResponseCacheKeyGenerator = Arc<dyn Fn(&http::Request<Body>) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ResponseCachePolicy {
    pub ttl: Duration,
    pub key_prefix: String,
    pub include_query: bool,
    pub per_user: bool,
    pub max_body_size: usize,
    key_generator: Option<ResponseCacheKeyGenerator>,
}

impl ResponseCachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            key_prefix: DEFAULT_RESPONSE_CACHE_KEY_PREFIX.to_string(),
            include_query: true,
            per_user: false,
            max_body_size: DEFAULT_MAX_CACHEABLE_BODY_SIZE,
            key_generator: None,
        }
    }

    /// Collections, keyed by path and query
    pub fn list() -> Self {
        Self::new(Duration::from_secs(300))
    }

    /// Individual resources, keyed by path only
    pub fn single_resource() -> Self {
        Self::new(Duration::from_secs(600)).with_include_query(false)
    }

    /// Views that differ between accounts
    pub fn per_user() -> Self {
        Self::new(Duration::from_secs(180)).with_per_user(true)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn with_include_query(mut self, include_query: bool) -> Self {
        self.include_query = include_query;
        self
    }

    pub fn with_per_user(mut self, per_user: bool) -> Self {
        self.per_user = per_user;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Replaces the default key derivation entirely
    pub fn with_key_generator(
        mut self,
        key_generator: impl Fn(&http::Request<Body>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.key_generator = Some(Arc::new(key_generator));
        self
    }

    pub fn cache_key(&self, request: &http::Request<Body>) -> String {
        if let Some(key_generator) = &self.key_generator {
            return key_generator(request);
        }

        let mut key = format!(
            "{}:{}:{}",
            self.key_prefix,
            request.method(),
            request.uri().path()
        );

        if self.include_query
            && let Some(query) = request.uri().query()
        {
            let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();

            if !pairs.is_empty() {
                pairs.sort();

                // Re-encoded so that reserved characters inside values cannot
                // imitate pair separators
                key.push('?');
                key.push_str(
                    &url::form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(&pairs)
                        .finish(),
                );
            }
        }

        if self.per_user
            && let Some(CurrentAccountSubject::Logged(logged)) =
                request.extensions().get::<CurrentAccountSubject>()
        {
            key.push_str(&format!(":user:{}", logged.account_id));
        }

        key
    }
}

impl Default for ResponseCachePolicy {
    fn default() -> Self {
        Self::list()
    }
}

impl fmt::Debug for ResponseCachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCachePolicy")
            .field("ttl", &self.ttl)
            .field("key_prefix", &self.key_prefix)
            .field("include_query", &self.include_query)
            .field("per_user", &self.per_user)
            .field("max_body_size", &self.max_body_size)
            .field("custom_key_generator", &self.key_generator.is_some())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Stored form of a successful `GET` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(with = "base64_body")]
    pub body: Vec<u8>,
}

impl CachedResponse {
    fn capture(parts: &http::response::Parts, body: &[u8]) -> Self {
        let headers = parts
            .headers
            .iter()
            .filter(|(name, _)| is_replayable_header(name))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();

        Self {
            status: parts.status.as_u16(),
            headers,
            body: body.to_vec(),
        }
    }

    fn replay(self) -> Option<Response> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder.body(Body::from(self.body)).ok()
    }
}

mod base64_body {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cache-aside for `GET` handlers.
///
/// A hit replays the stored response without invoking the handler. A miss
/// runs the handler and stores a `2xx` response in the background, unless it
/// carries `Cache-Control: no-store`. Both outcomes are reported through the
/// `X-Cache` header. Without a configured cache store the layer is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ResponseCacheLayer {
    policy: Arc<ResponseCachePolicy>,
}

impl ResponseCacheLayer {
    pub fn new(policy: ResponseCachePolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<Svc> Layer<Svc> for ResponseCacheLayer {
    type Service = ResponseCacheMiddleware<Svc>;

    fn layer(&self, inner: Svc) -> Self::Service {
        ResponseCacheMiddleware {
            inner,
            policy: self.policy.clone(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct ResponseCacheMiddleware<Svc> {
    inner: Svc,
    policy: Arc<ResponseCachePolicy>,
}

fn is_no_store(response: &Response) -> bool {
    response
        .headers()
        .get_all(http::header::CACHE_CONTROL)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-store"))
}

// Streaming bodies without a known upper bound are never buffered
fn fits_in_cache(response: &Response, max_body_size: usize) -> bool {
    use axum::body::HttpBody as _;

    response
        .body()
        .size_hint()
        .upper()
        .and_then(|upper| usize::try_from(upper).ok())
        .is_some_and(|upper| upper <= max_body_size)
}

fn mark(mut response: Response, x_cache: &'static str) -> Response {
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static(x_cache));
    response
}

impl<Svc> Service<http::Request<Body>> for ResponseCacheMiddleware<Svc>
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
            if request.method() != http::Method::GET {
                return inner.call(request).await;
            }

            let cache_service = catalog_of(&request)
                .get_one::<dyn CacheService>()
                .unwrap();
            if !cache_service.is_enabled() {
                return inner.call(request).await;
            }

            let key = policy.cache_key(&request);

            if let Some(cached) = cache_service.get_json::<CachedResponse>(&key).await {
                if let Some(response) = cached.replay() {
                    tracing::debug!(key, "Serving response from cache");
                    return Ok(mark(response, X_CACHE_HIT));
                }
                tracing::warn!(key, "Ignoring unreplayable cached response");
            }

            let response = inner.call(request).await?;

            if !response.status().is_success() || is_no_store(&response) {
                return Ok(mark(response, X_CACHE_MISS));
            }

            if !fits_in_cache(&response, policy.max_body_size) {
                tracing::debug!(key, "Response body is too large or unsized, not caching");
                return Ok(mark(response, X_CACHE_MISS));
            }

            let (parts, body) = response.into_parts();
            let body = match axum::body::to_bytes(body, policy.max_body_size).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(key, error = ?e, error_msg = %e, "Failed to buffer response body");
                    return Ok(internal_server_error_response());
                }
            };

            let cached = CachedResponse::capture(&parts, &body);
            let ttl = policy.ttl;
            tokio::spawn(async move {
                cache_service.set_json(&key, &cached, Some(ttl)).await;
            });

            Ok(mark(
                Response::from_parts(parts, Body::from(body)),
                X_CACHE_MISS,
            ))
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
