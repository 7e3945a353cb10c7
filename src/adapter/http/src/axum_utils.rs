// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::body::Body;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Resolves several components at once: `from_catalog_n!(catalog, dyn A, B)`
macro_rules! from_catalog_n {
    ($catalog:expr, $($component:ty),+ $(,)?) => {
        ( $( $catalog.get_one::<$component>().unwrap() ),+ )
    };
}

pub(crate) use from_catalog_n;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn catalog_of(request: &http::Request<Body>) -> dill::Catalog {
    request
        .extensions()
        .get::<dill::Catalog>()
        .expect("Catalog not found in http server extensions")
        .clone()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn bad_request_response() -> axum::response::Response {
    error_response(http::StatusCode::BAD_REQUEST)
}

pub(crate) fn internal_server_error_response() -> axum::response::Response {
    error_response(http::StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(status: http::StatusCode) -> axum::response::Response {
    let mut response = axum::response::Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
