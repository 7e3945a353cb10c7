// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use k256::ecdsa::SigningKey;

use crate::EvmWalletAddress;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Deterministic wallet that signs sign-in messages the way browser wallets do
/// (`personal_sign`, i.e. EIP-191 over the message text)
pub struct TestWallet {
    signing_key: SigningKey,
}

impl TestWallet {
    pub fn from_seed(seed: u8) -> Self {
        let mut secret = [0x42_u8; 32];
        secret[31] = seed;

        Self {
            signing_key: SigningKey::from_slice(&secret).unwrap(),
        }
    }

    pub fn address(&self) -> EvmWalletAddress {
        let public_key = self.signing_key.verifying_key().to_encoded_point(false);
        let hash = alloy_primitives::keccak256(&public_key.as_bytes()[1..]);

        EvmWalletAddress::from_slice(&hash[12..])
    }

    /// Returns a `0x`-prefixed 65-byte `r || s || v` signature
    pub fn sign_message(&self, message: &str) -> String {
        let parsed: siwe::Message = message.parse().unwrap();
        let prehash = parsed.eip191_hash().unwrap();

        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&prehash)
            .unwrap();

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(27 + recovery_id.to_byte());

        format!("0x{}", hex::encode(bytes))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
