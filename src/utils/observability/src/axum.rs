// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::extract::MatchedPath;
use axum::response::IntoResponse;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&http::Request<axum::body::Body>) -> tracing::Span,
    DefaultOnRequest,
    DefaultOnResponse,
>;

/// Opens one `http.request` span per request, named after the matched route
/// template rather than the raw path to keep cardinality low
pub fn http_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(make_request_span as fn(&http::Request<axum::body::Body>) -> tracing::Span)
        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO))
}

fn make_request_span(request: &http::Request<axum::body::Body>) -> tracing::Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    tracing::info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = route,
        http.uri = %request.uri(),
    )
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[allow(clippy::unused_async)]
pub async fn unknown_fallback_handler() -> impl IntoResponse {
    (
        http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({"message": "Not found"})),
    )
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
