// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use internal_error::BoxedError;
use thiserror::Error;

use crate::VerifiedWeb3Message;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Checks an EIP-4361 sign-in message against its EIP-191 signature.
///
/// Verification has no side effects: the nonce carried by the message is
/// returned to the caller, which is responsible for consuming it.
pub trait Web3SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        message: &str,
        signature: &str,
    ) -> Result<VerifiedWeb3Message, Web3SignatureVerificationError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug)]
pub enum Web3SignatureVerificationError {
    #[error("Malformed sign-in message")]
    MalformedMessage(#[source] BoxedError),

    #[error("Malformed signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("Signature does not match the message address")]
    SignatureMismatch,

    #[error("Sign-in message has expired")]
    ExpiredMessage,

    #[error("Sign-in message is not valid yet")]
    NotYetValidMessage,

    #[error("Sign-in message is addressed to '{actual}' instead of '{expected}'")]
    DomainMismatch { expected: String, actual: String },
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
