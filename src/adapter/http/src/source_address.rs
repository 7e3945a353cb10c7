// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;
use http::{Extensions, HeaderMap};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const UNKNOWN_SOURCE_ADDRESS: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Best-effort client address: the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer of the TCP connection.
///
/// Proxy headers are trusted as is, so the server must sit behind a proxy
/// that overwrites them.
pub fn resolve_source_address(headers: &HeaderMap, extensions: &Extensions) -> String {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(first_hop) = header_str(X_FORWARDED_FOR)
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
    {
        return first_hop.to_string();
    }

    if let Some(real_ip) = header_str(X_REAL_IP) {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(peer)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return peer.ip().to_string();
    }

    UNKNOWN_SOURCE_ADDRESS.to_string()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Extractor flavor of [`resolve_source_address`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAddress(pub String);

impl<S> FromRequestParts<S> for SourceAddress
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_source_address(&parts.headers, &parts.extensions)))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
