// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod audit_layer;
mod authentication_layer;
mod cache_invalidation_layer;
mod rate_limit_layer;
mod response_cache_layer;

pub use audit_layer::*;
pub use authentication_layer::*;
pub use cache_invalidation_layer::*;
pub use rate_limit_layer::*;
pub use response_cache_layer::*;
