// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::str::FromStr;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub type EvmWalletAddress = alloy_primitives::Address;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Wallet addresses are compared as 20-byte values. Wherever an address is
/// rendered for storage or comparison by string, the lowercase form is used;
/// the EIP-55 checksummed form is only for display and sign-in messages.
pub struct EvmWalletAddressConvertor;

impl EvmWalletAddressConvertor {
    pub fn parse(value: &str) -> Result<EvmWalletAddress, InvalidWalletAddressError> {
        let trimmed = value.trim();

        let is_well_formed = trimmed.len() == 42
            && trimmed.starts_with("0x")
            && trimmed[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !is_well_formed {
            return Err(InvalidWalletAddressError {
                value: value.to_string(),
            });
        }

        EvmWalletAddress::from_str(trimmed).map_err(|_| InvalidWalletAddressError {
            value: value.to_string(),
        })
    }

    pub fn lowercase_string(wallet_address: &EvmWalletAddress) -> String {
        format!("0x{}", hex::encode(wallet_address.as_slice()))
    }

    pub fn checksummed_string(wallet_address: &EvmWalletAddress) -> String {
        wallet_address.to_checksum(None)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid wallet address: '{value}'")]
pub struct InvalidWalletAddressError {
    pub value: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
