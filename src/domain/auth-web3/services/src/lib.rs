// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod dependencies;
mod web3_nonce_service_impl;
mod web3_signature_verifier_impl;

pub use dependencies::*;
pub use web3_nonce_service_impl::*;
pub use web3_signature_verifier_impl::*;
