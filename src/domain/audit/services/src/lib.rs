// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod audit_queue;
mod audit_worker;
mod channel_audit_logger;
mod dependencies;

pub use audit_queue::*;
pub use audit_worker::*;
pub use channel_audit_logger::*;
pub use dependencies::*;
