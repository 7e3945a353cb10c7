// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::AuditEvent;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Fire-and-forget sink for audit events. Never blocks the caller and never
/// fails: events that cannot be accepted are dropped with a warning.
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
