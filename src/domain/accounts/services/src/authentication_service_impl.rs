// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use internal_error::{ErrorIntoInternal, InternalError, ResultIntoInternal};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lectern_accounts::*;
use lectern_auth_web3::{
    ConsumeNonceError,
    EvmWalletAddress,
    EvmWalletAddressConvertor,
    Web3NonceService,
    Web3SignatureVerifier,
};
use secrecy::ExposeSecret;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[dill::component]
#[dill::interface(dyn AuthenticationService)]
pub struct AuthenticationServiceImpl {
    signature_verifier: Arc<dyn Web3SignatureVerifier>,
    nonce_service: Arc<dyn Web3NonceService>,
    account_repo: Arc<dyn AccountRepository>,
    time_source: Arc<dyn SystemTimeSource>,
    config: Arc<JwtAuthenticationConfig>,
}

impl AuthenticationServiceImpl {
    fn make_access_token(&self, account: &Account) -> Result<String, InternalError> {
        let now = self.time_source.now();
        let expires_at = now + self.config.access_token_lifetime;

        let claims = AccessTokenClaims {
            sub: account.id.to_string(),
            wallet_address: EvmWalletAddressConvertor::lowercase_string(&account.wallet_address),
            iat: usize::try_from(now.timestamp()).int_err()?,
            exp: usize::try_from(expires_at.timestamp()).int_err()?,
            iss: ACCESS_TOKEN_ISSUER.to_string(),
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.expose_secret().as_bytes()),
        )
        .int_err()
    }

    fn decode_access_token(&self, access_token: &str) -> Result<AccessTokenClaims, AccessTokenError> {
        let mut validation = Validation::new(Algorithm::HS384);
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        // Expiry is checked against the injected time source below
        validation.validate_exp = false;

        let claims = jsonwebtoken::decode::<AccessTokenClaims>(
            access_token,
            &DecodingKey::from_secret(self.config.jwt_secret.expose_secret().as_bytes()),
            &validation,
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AccessTokenError::Expired,
            _ => AccessTokenError::Invalid(Box::new(e)),
        })?;

        let now = self.time_source.now().timestamp();
        let is_expired = i64::try_from(claims.exp).is_ok_and(|exp| exp <= now);
        if is_expired {
            return Err(AccessTokenError::Expired);
        }

        Ok(claims)
    }

    async fn find_or_register_account(
        &self,
        wallet_address: &EvmWalletAddress,
    ) -> Result<Account, InternalError> {
        let now = self.time_source.now();

        if let Some(account) = self
            .account_repo
            .find_account_by_wallet_address(wallet_address)
            .await
            .int_err()?
        {
            return self.touch_last_login(account, now).await;
        }

        let new_account = Account::new_for_wallet(*wallet_address, now);
        match self.account_repo.create_account(&new_account).await {
            Ok(()) => {
                tracing::info!(
                    account_id = %new_account.id,
                    %wallet_address,
                    "Registered account on first wallet sign-in"
                );
                Ok(new_account)
            }
            Err(CreateAccountError::Duplicate(_)) => {
                // A concurrent sign-in of the same wallet registered it first
                let account = self
                    .account_repo
                    .find_account_by_wallet_address(wallet_address)
                    .await
                    .int_err()?
                    .ok_or_else(|| {
                        format!("Account of wallet {wallet_address} vanished after a duplicate insert")
                            .int_err()
                    })?;

                self.touch_last_login(account, now).await
            }
            Err(CreateAccountError::Internal(e)) => Err(e),
        }
    }

    async fn touch_last_login(
        &self,
        mut account: Account,
        now: DateTime<Utc>,
    ) -> Result<Account, InternalError> {
        self.account_repo
            .update_last_login(&account.id, now)
            .await
            .int_err()?;

        account.last_login_at = now;
        Ok(account)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl AuthenticationService for AuthenticationServiceImpl {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn login_with_wallet(
        &self,
        message: &str,
        signature: &str,
    ) -> Result<LoginResponse, LoginError> {
        let verified = self
            .signature_verifier
            .verify(message, signature)
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Wallet sign-in rejected");
            })?;

        let wallet_address = verified.wallet_address;

        match self
            .nonce_service
            .consume_nonce(&wallet_address, &verified.nonce)
            .await
        {
            Ok(()) => {}
            Err(ConsumeNonceError::NotFound(_)) => {
                tracing::warn!(
                    %wallet_address,
                    "Wallet sign-in rejected: nonce is unknown, expired or already used"
                );
                return Err(LoginError::InvalidOrExpiredNonce);
            }
            Err(ConsumeNonceError::Internal(e)) => return Err(e.into()),
        }

        let account = self.find_or_register_account(&wallet_address).await?;
        let access_token = self.make_access_token(&account)?;

        tracing::info!(account_id = %account.id, %wallet_address, "Wallet sign-in succeeded");

        Ok(LoginResponse {
            access_token,
            account,
        })
    }

    #[tracing::instrument(level = "debug", skip_all)]
    async fn account_by_token(&self, access_token: &str) -> Result<Account, GetAccountInfoError> {
        let claims = self
            .decode_access_token(access_token)
            .map_err(GetAccountInfoError::AccessToken)?;

        let account_id = uuid::Uuid::parse_str(&claims.sub)
            .map_err(|e| GetAccountInfoError::AccessToken(AccessTokenError::Invalid(e.into())))?;

        match self.account_repo.get_account_by_id(&account_id).await {
            Ok(account) => Ok(account),
            Err(GetAccountByIdError::NotFound(_)) => Err(GetAccountInfoError::AccountUnresolved),
            Err(GetAccountByIdError::Internal(e)) => Err(e.into()),
        }
    }

    async fn account_by_id(&self, account_id: &AccountID) -> Result<Option<Account>, InternalError> {
        match self.account_repo.get_account_by_id(account_id).await {
            Ok(account) => Ok(Some(account)),
            Err(GetAccountByIdError::NotFound(_)) => Ok(None),
            Err(GetAccountByIdError::Internal(e)) => Err(e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
