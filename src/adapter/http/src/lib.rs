// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod auth;
mod axum_utils;
mod middleware;
mod source_address;

pub use auth::*;
pub use middleware::*;
pub use source_address::*;
