// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use dill::Catalog;
use http_common::{ApiError, IntoApiError, ResultIntoApiError};
use internal_error::ResultIntoInternal;
use lectern_accounts::{AccountView, AuthenticationService, CurrentAccountSubject, LoginError};
use lectern_audit::{AuditAction, AuditEvent, AuditLogger};
use lectern_auth_web3::{EvmWalletAddressConvertor, Web3NonceService};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time_source::SystemTimeSource;

use crate::SourceAddress;
use crate::axum_utils::from_catalog_n;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthNonceRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthNonceResponse {
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues a single-use sign-in challenge for a wallet
pub async fn auth_nonce_handler(
    Extension(catalog): Extension<Catalog>,
    SourceAddress(source_address): SourceAddress,
    Json(request): Json<AuthNonceRequest>,
) -> Result<Json<AuthNonceResponse>, ApiError> {
    let (nonce_service, audit_logger, time_source) = from_catalog_n!(
        catalog,
        dyn Web3NonceService,
        dyn AuditLogger,
        dyn SystemTimeSource
    );

    let wallet_address =
        EvmWalletAddressConvertor::parse(&request.wallet_address).map_err(ApiError::bad_request)?;

    let nonce_entity = nonce_service
        .create_nonce(wallet_address)
        .await
        .int_err()
        .api_err()?;

    audit_logger.log(
        AuditEvent::new(AuditAction::NonceIssued, time_source.now())
            .with_source_address(source_address)
            .with_details(serde_json::json!({
                "walletAddress": EvmWalletAddressConvertor::lowercase_string(&wallet_address),
            })),
    );

    Ok(Json(AuthNonceResponse {
        nonce: nonce_entity.nonce.to_string(),
        expires_at: nonce_entity.expires_at,
    }))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthVerifyRequest {
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthVerifyResponse {
    pub access_token: String,
    pub account: AccountView,
}

// The same answer for every protocol failure, so that callers cannot probe
// which check rejected them
#[derive(Debug, Error)]
#[error("Authentication failed")]
pub struct AuthenticationFailedError;

/// Exchanges a signed sign-in message for an access token
pub async fn auth_verify_handler(
    Extension(catalog): Extension<Catalog>,
    SourceAddress(source_address): SourceAddress,
    Json(request): Json<AuthVerifyRequest>,
) -> Result<Json<AuthVerifyResponse>, ApiError> {
    let (authentication_service, audit_logger, time_source) = from_catalog_n!(
        catalog,
        dyn AuthenticationService,
        dyn AuditLogger,
        dyn SystemTimeSource
    );

    match authentication_service
        .login_with_wallet(&request.message, &request.signature)
        .await
    {
        Ok(login) => {
            audit_logger.log(
                AuditEvent::new(AuditAction::LoginSucceeded, time_source.now())
                    .with_account_id(login.account.id)
                    .with_source_address(source_address),
            );

            Ok(Json(AuthVerifyResponse {
                access_token: login.access_token,
                account: AccountView::from(&login.account),
            }))
        }
        Err(LoginError::Internal(e)) => Err(e.api_err()),
        Err(e @ (LoginError::Verification(_) | LoginError::InvalidOrExpiredNonce)) => {
            audit_logger.log(
                AuditEvent::new(AuditAction::LoginFailed, time_source.now())
                    .with_source_address(source_address)
                    .with_details(serde_json::json!({ "reason": e.to_string() })),
            );

            Err(ApiError::new_unauthorized_from(AuthenticationFailedError))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Profile of the account the bearer token belongs to
pub async fn auth_me_handler(
    Extension(catalog): Extension<Catalog>,
    Extension(subject): Extension<CurrentAccountSubject>,
) -> Result<Json<AccountView>, ApiError> {
    let CurrentAccountSubject::Logged(logged) = subject else {
        return Err(ApiError::new_unauthorized());
    };

    let authentication_service = catalog.get_one::<dyn AuthenticationService>().unwrap();

    match authentication_service
        .account_by_id(&logged.account_id)
        .await
        .api_err()?
    {
        Some(account) => Ok(Json(AccountView::from(&account))),
        None => Err(ApiError::new_unauthorized()),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
