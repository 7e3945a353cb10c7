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
use lectern_accounts::{
    AccessTokenError,
    AnonymousAccountReason,
    AuthenticationService,
    CurrentAccountSubject,
    GetAccountInfoError,
};
use tower::{Layer, Service};

use crate::axum_utils::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const BEARER_SCHEME: &str = "bearer";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Resolves the bearer token of a request into a [`CurrentAccountSubject`].
///
/// The subject is placed both into the request extensions and into a chained
/// catalog that replaces the base one for the rest of the request. Requests
/// without a usable token proceed anonymously; an empty bearer token is
/// rejected with `400 Bad Request`.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationLayer {}

impl AuthenticationLayer {
    pub fn new() -> Self {
        Self {}
    }
}

impl<Svc> Layer<Svc> for AuthenticationLayer {
    type Service = AuthenticationMiddleware<Svc>;

    fn layer(&self, inner: Svc) -> Self::Service {
        AuthenticationMiddleware { inner }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct AuthenticationMiddleware<Svc> {
    inner: Svc,
}

enum BearerToken {
    Absent,
    Empty,
    Present(String),
}

impl<Svc> AuthenticationMiddleware<Svc> {
    fn extract_bearer_token(request: &http::Request<Body>) -> BearerToken {
        let Some(value) = request
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        else {
            return BearerToken::Absent;
        };

        let value = value.trim();
        let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
        if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
            return BearerToken::Absent;
        }

        let token = token.trim();
        if token.is_empty() {
            BearerToken::Empty
        } else {
            BearerToken::Present(token.to_string())
        }
    }

    async fn current_account_subject(
        authentication_service: &dyn AuthenticationService,
        access_token: &str,
    ) -> Result<CurrentAccountSubject, Response> {
        match authentication_service.account_by_token(access_token).await {
            Ok(account) => Ok(CurrentAccountSubject::logged(&account)),
            Err(GetAccountInfoError::AccessToken(AccessTokenError::Expired)) => Ok(
                CurrentAccountSubject::anonymous(AnonymousAccountReason::AuthenticationExpired),
            ),
            Err(
                GetAccountInfoError::AccessToken(AccessTokenError::Invalid(_))
                | GetAccountInfoError::AccountUnresolved,
            ) => Ok(CurrentAccountSubject::anonymous(
                AnonymousAccountReason::AuthenticationInvalid,
            )),
            Err(GetAccountInfoError::Internal(e)) => {
                tracing::error!(error = ?e, error_msg = %e, "Failed to resolve access token");
                Err(internal_server_error_response())
            }
        }
    }
}

impl<Svc> Service<http::Request<Body>> for AuthenticationMiddleware<Svc>
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

    fn call(&mut self, mut request: http::Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let base_catalog = catalog_of(&request);

            let subject = match Self::extract_bearer_token(&request) {
                BearerToken::Absent => CurrentAccountSubject::anonymous(
                    AnonymousAccountReason::NoAuthenticationProvided,
                ),
                BearerToken::Empty => return Ok(bad_request_response()),
                BearerToken::Present(access_token) => {
                    let authentication_service = base_catalog
                        .get_one::<dyn AuthenticationService>()
                        .unwrap();

                    match Self::current_account_subject(
                        authentication_service.as_ref(),
                        &access_token,
                    )
                    .await
                    {
                        Ok(subject) => subject,
                        Err(response) => return Ok(response),
                    }
                }
            };

            let derived_catalog = dill::CatalogBuilder::new_chained(&base_catalog)
                .add_value(subject.clone())
                .build();

            request.extensions_mut().insert(subject);
            request.extensions_mut().insert(derived_catalog);

            inner.call(request).await
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
