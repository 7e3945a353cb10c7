// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use lectern_audit::{AuditEvent, AuditLogger};
use tokio::sync::mpsc::error::TrySendError;

use crate::AuditQueue;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[dill::component(pub)]
#[dill::interface(dyn AuditLogger)]
pub struct ChannelAuditLogger {
    queue: Arc<AuditQueue>,
}

impl AuditLogger for ChannelAuditLogger {
    fn log(&self, event: AuditEvent) {
        match self.queue.sender().try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    event_id = %event.id,
                    action = ?event.action,
                    "Audit queue is full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    event_id = %event.id,
                    action = ?event.action,
                    "Audit queue is closed, dropping event"
                );
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
