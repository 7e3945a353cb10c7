// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::Utc;
use dill::{Catalog, CatalogBuilder};
use internal_error::InternalError;
use lectern_audit::*;
use lectern_audit_inmem::InMemoryAuditEventRepository;
use lectern_audit_services::*;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_logged_events_reach_repository() {
    let harness = AuditHarness::new(AuditConfig::default(), |b| {
        b.add::<InMemoryAuditEventRepository>();
    });

    let (stop_tx, worker) = harness.spawn_worker();

    let login = AuditEvent::new(AuditAction::LoginSucceeded, Utc::now())
        .with_source_address("198.51.100.4");
    harness.audit_logger().log(login.clone());

    stop_tx.send(()).unwrap();
    worker.await.unwrap().unwrap();

    let saved = harness.audit_event_repo().list_recent_events(10).await.unwrap();
    assert_eq!(saved, vec![login]);
}

#[test_log::test(tokio::test)]
async fn test_full_queue_drops_events() {
    let harness = AuditHarness::new(AuditConfig { queue_capacity: 2 }, |b| {
        b.add::<InMemoryAuditEventRepository>();
    });

    // Nothing drains the queue yet
    let logger = harness.audit_logger();
    for _ in 0..5 {
        logger.log(AuditEvent::new(AuditAction::NonceIssued, Utc::now()));
    }

    let (stop_tx, worker) = harness.spawn_worker();
    stop_tx.send(()).unwrap();
    worker.await.unwrap().unwrap();

    let saved = harness.audit_event_repo().list_recent_events(10).await.unwrap();
    assert_eq!(saved.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_failed_save_does_not_stop_worker() {
    let first = AuditEvent::new(AuditAction::LoginFailed, Utc::now());
    let second = AuditEvent::new(AuditAction::LoginSucceeded, Utc::now());

    let mut repo = MockAuditEventRepository::new();
    let first_id = first.id;
    repo.expect_save_event()
        .withf(move |event| event.id == first_id)
        .times(1)
        .returning(|_| Err(InternalError::new("disk full").into()));
    let second_id = second.id;
    repo.expect_save_event()
        .withf(move |event| event.id == second_id)
        .times(1)
        .returning(|_| Ok(()));

    let harness = AuditHarness::new(AuditConfig::default(), |b| {
        b.add_value(repo)
            .bind::<dyn AuditEventRepository, MockAuditEventRepository>();
    });

    let logger = harness.audit_logger();
    logger.log(first);
    logger.log(second);

    let (stop_tx, worker) = harness.spawn_worker();
    stop_tx.send(()).unwrap();
    worker.await.unwrap().unwrap();
}

#[test_log::test(tokio::test)]
async fn test_only_one_worker_per_queue() {
    let harness = AuditHarness::new(AuditConfig::default(), |b| {
        b.add::<InMemoryAuditEventRepository>();
    });

    let queue = harness.catalog.get_one::<AuditQueue>().unwrap();
    let _receiver = queue.take_receiver().unwrap();

    let worker = harness.catalog.get_one::<AuditWorker>().unwrap();
    assert!(worker.run(std::future::pending()).await.is_err());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct AuditHarness {
    catalog: Catalog,
}

impl AuditHarness {
    fn new(config: AuditConfig, configure: impl FnOnce(&mut CatalogBuilder)) -> Self {
        let mut b = CatalogBuilder::new();
        b.add_value(config);
        register_dependencies(&mut b);
        configure(&mut b);

        Self { catalog: b.build() }
    }

    fn audit_logger(&self) -> Arc<dyn AuditLogger> {
        self.catalog.get_one().unwrap()
    }

    fn audit_event_repo(&self) -> Arc<dyn AuditEventRepository> {
        self.catalog.get_one().unwrap()
    }

    fn spawn_worker(
        &self,
    ) -> (
        oneshot::Sender<()>,
        tokio::task::JoinHandle<Result<(), InternalError>>,
    ) {
        let worker = self.catalog.get_one::<AuditWorker>().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            worker
                .run(async {
                    stop_rx.await.ok();
                })
                .await
        });

        (stop_tx, handle)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
