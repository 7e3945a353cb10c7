// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::Duration;
use random_strings::{AllowedSymbols, get_random_string};
use secrecy::SecretString;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const DEFAULT_ACCESS_TOKEN_LIFETIME_DAYS: i64 = 7;

const GENERATED_JWT_SECRET_LENGTH: usize = 64;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct JwtAuthenticationConfig {
    pub jwt_secret: SecretString,
    pub access_token_lifetime: Duration,
}

impl JwtAuthenticationConfig {
    /// Without an explicit secret a random one is generated, so tokens do not
    /// survive a restart
    pub fn new(maybe_jwt_secret: Option<String>) -> Self {
        let jwt_secret = maybe_jwt_secret.unwrap_or_else(|| {
            get_random_string(
                None,
                GENERATED_JWT_SECRET_LENGTH,
                &AllowedSymbols::AsciiSymbols,
            )
        });

        Self {
            jwt_secret: SecretString::from(jwt_secret),
            access_token_lifetime: Duration::days(DEFAULT_ACCESS_TOKEN_LIFETIME_DAYS),
        }
    }

    pub fn with_access_token_lifetime(mut self, access_token_lifetime: Duration) -> Self {
        self.access_token_lifetime = access_token_lifetime;
        self
    }
}

impl Default for JwtAuthenticationConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
