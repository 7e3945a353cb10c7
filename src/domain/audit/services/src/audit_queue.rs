// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Arc, Mutex};

use dill::*;
use lectern_audit::{AuditConfig, AuditEvent};
use tokio::sync::mpsc;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Bounded channel shared by the loggers (producers) and the single
/// [`crate::AuditWorker`] (consumer)
pub struct AuditQueue {
    sender: mpsc::Sender<AuditEvent>,
    receiver: Mutex<Option<mpsc::Receiver<AuditEvent>>>,
}

#[component(pub)]
#[scope(Singleton)]
impl AuditQueue {
    pub fn new(config: Arc<AuditConfig>) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));

        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    pub fn sender(&self) -> &mpsc::Sender<AuditEvent> {
        &self.sender
    }

    /// The receiving end can be claimed only once
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<AuditEvent>> {
        self.receiver.lock().unwrap().take()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
