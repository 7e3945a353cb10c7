// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{EvmWalletAddress, Web3AuthenticationNonce};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Outcome of a successful signature check: the signer is proven to own
/// `wallet_address`, but `nonce` still has to be consumed before the message
/// can be trusted as fresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedWeb3Message {
    pub wallet_address: EvmWalletAddress,
    pub nonce: Web3AuthenticationNonce,
    pub domain: String,
    pub chain_id: u64,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
