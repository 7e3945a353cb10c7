// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lectern_auth_web3::*;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const SIGNATURE_LENGTH: usize = 65;

#[dill::component]
#[dill::interface(dyn Web3SignatureVerifier)]
pub struct Web3SignatureVerifierImpl {
    time_source: Arc<dyn SystemTimeSource>,
    config: Arc<Web3AuthConfig>,
}

impl Web3SignatureVerifierImpl {
    fn decode_signature(
        signature: &str,
    ) -> Result<[u8; SIGNATURE_LENGTH], Web3SignatureVerificationError> {
        let hex_part = signature
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| Web3SignatureVerificationError::MalformedSignature {
                reason: "missing 0x prefix".to_string(),
            })?;

        let bytes = hex::decode(hex_part).map_err(|e| {
            Web3SignatureVerificationError::MalformedSignature {
                reason: e.to_string(),
            }
        })?;

        let actual_length = bytes.len();
        bytes
            .try_into()
            .map_err(|_| Web3SignatureVerificationError::MalformedSignature {
                reason: format!("expected {SIGNATURE_LENGTH} bytes, got {actual_length}"),
            })
    }

    fn parse_timestamp(
        timestamp: &siwe::TimeStamp,
    ) -> Result<DateTime<Utc>, Web3SignatureVerificationError> {
        DateTime::parse_from_rfc3339(&timestamp.to_string())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| Web3SignatureVerificationError::MalformedMessage(e.into()))
    }

    fn check_validity_window(
        &self,
        message: &siwe::Message,
    ) -> Result<(), Web3SignatureVerificationError> {
        let now = self.time_source.now();

        if let Some(expiration_time) = &message.expiration_time
            && Self::parse_timestamp(expiration_time)? <= now
        {
            return Err(Web3SignatureVerificationError::ExpiredMessage);
        }

        if let Some(not_before) = &message.not_before
            && Self::parse_timestamp(not_before)? > now
        {
            return Err(Web3SignatureVerificationError::NotYetValidMessage);
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

impl Web3SignatureVerifier for Web3SignatureVerifierImpl {
    #[tracing::instrument(level = "debug", skip_all)]
    fn verify(
        &self,
        message: &str,
        signature: &str,
    ) -> Result<VerifiedWeb3Message, Web3SignatureVerificationError> {
        let parsed = siwe::Message::from_str(message)
            .map_err(|e| Web3SignatureVerificationError::MalformedMessage(e.into()))?;

        let signature = Self::decode_signature(signature)?;

        parsed.verify_eip191(&signature).map_err(|e| {
            tracing::debug!(error = %e, "Signature verification failed");
            Web3SignatureVerificationError::SignatureMismatch
        })?;

        self.check_validity_window(&parsed)?;

        let domain = parsed.domain.to_string();
        if let Some(expected_domain) = &self.config.expected_domain
            && *expected_domain != domain
        {
            return Err(Web3SignatureVerificationError::DomainMismatch {
                expected: expected_domain.clone(),
                actual: domain,
            });
        }

        let nonce = Web3AuthenticationNonce::try_new(parsed.nonce)
            .map_err(|e| Web3SignatureVerificationError::MalformedMessage(e.into()))?;

        Ok(VerifiedWeb3Message {
            wallet_address: EvmWalletAddress::from(parsed.address),
            nonce,
            domain,
            chain_id: parsed.chain_id,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
