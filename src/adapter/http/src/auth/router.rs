// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::Router;
use axum::routing::{get, post};

use crate::{RateLimitLayer, RateLimitPolicy};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Wallet sign-in endpoints. The handshake routes share one
/// [`RateLimitPolicy::auth`] quota per source address.
///
/// Expects a `dill::Catalog` extension and [`crate::AuthenticationLayer`]
/// to be installed by the enclosing router.
pub fn auth_router() -> Router {
    let handshake = Router::new()
        .route("/auth/nonce", post(super::auth_nonce_handler))
        .route("/auth/verify", post(super::auth_verify_handler))
        .route_layer(RateLimitLayer::new(RateLimitPolicy::auth()));

    Router::new()
        .route("/auth/me", get(super::auth_me_handler))
        .merge(handshake)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
