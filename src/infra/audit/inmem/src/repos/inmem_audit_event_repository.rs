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

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct InMemoryAuditEventRepository {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

#[component(pub)]
#[interface(dyn AuditEventRepository)]
#[scope(Singleton)]
impl InMemoryAuditEventRepository {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl AuditEventRepository for InMemoryAuditEventRepository {
    async fn save_event(&self, event: &AuditEvent) -> Result<(), SaveAuditEventError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn list_recent_events(
        &self,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, ListAuditEventsError> {
        let guard = self.events.lock().unwrap();

        // Ties on the timestamp keep insertion order reversed
        let mut events: Vec<_> = guard.iter().rev().cloned().collect();
        events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        events.truncate(limit);

        Ok(events)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
