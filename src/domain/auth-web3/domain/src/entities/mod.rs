// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod evm_wallet_address;
mod verified_web3_message;
mod web3_auth_nonce;

pub use evm_wallet_address::*;
pub use verified_web3_message::*;
pub use web3_auth_nonce::*;
