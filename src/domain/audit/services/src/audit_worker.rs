// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::future::Future;
use std::sync::Arc;

use internal_error::InternalError;
use lectern_audit::{AuditEvent, AuditEventRepository};

use crate::AuditQueue;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Drains the audit queue into the repository
#[dill::component(pub)]
pub struct AuditWorker {
    queue: Arc<AuditQueue>,
    audit_event_repo: Arc<dyn AuditEventRepository>,
}

impl AuditWorker {
    /// Runs until `shutdown` resolves, then persists whatever is still
    /// queued and returns. Only one worker may run per queue.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), InternalError> {
        let Some(mut receiver) = self.queue.take_receiver() else {
            return InternalError::bail("Audit worker is already running");
        };

        tracing::info!("Audit worker started");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                maybe_event = receiver.recv() => match maybe_event {
                    Some(event) => self.persist(event).await,
                    None => break,
                },
                () = &mut shutdown => break,
            }
        }

        receiver.close();
        let mut flushed = 0;
        while let Ok(event) = receiver.try_recv() {
            self.persist(event).await;
            flushed += 1;
        }

        tracing::info!(flushed, "Audit worker stopped");

        Ok(())
    }

    async fn persist(&self, event: AuditEvent) {
        // Persistence failures are not retried
        if let Err(e) = self.audit_event_repo.save_event(&event).await {
            tracing::error!(
                error = ?e,
                error_msg = %e,
                event_id = %event.id,
                action = ?event.action,
                "Failed to persist audit event"
            );
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
