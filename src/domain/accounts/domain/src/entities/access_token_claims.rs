// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const ACCESS_TOKEN_ISSUER: &str = "lectern";

/// Claims of the bearer token handed out after a wallet sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub wallet_address: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
