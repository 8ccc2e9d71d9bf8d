//! Integration tests for the stock pipeline over the in-memory store.
//!
//! Tests: Coordinator → Store (lock, ledger, quantity) → AuditRecorder
//!
//! Verifies:
//! - On-hand quantity always equals the ledger sum
//! - Concurrent issues never oversell
//! - A fault between ledger append and quantity adjust leaves nothing behind
//! - Audit failures never undo the primary change

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use stockroom_audit::AuditEntry;
    use stockroom_core::{DomainError, PartId, UserId};
    use stockroom_inventory::{
        ledger_balance, MovementType, NewPart, RecordMovement, OPENING_BALANCE_REFERENCE,
    };

    use crate::audit_recorder::AuditRecorder;
    use crate::catalog::{CatalogError, PartCatalog};
    use crate::coordinator::{MovementError, StockMutationCoordinator};
    use crate::credentials::{CredentialError, CredentialVerifier};
    use crate::schema::seed_demo_data;
    use crate::store::{AuditStore, InMemoryStore, InventoryStore, StoreError, UserStore};

    const ADMIN: UserId = UserId::new(1);
    const CONTROLLER: UserId = UserId::new(2);
    const EFIS_UNIT: PartId = PartId::new(2);
    const GENERATOR_CONTROL_UNIT: PartId = PartId::new(5);

    struct Harness {
        store: Arc<InMemoryStore>,
        catalog: PartCatalog,
        coordinator: StockMutationCoordinator,
        audit: AuditRecorder,
    }

    async fn setup() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let seeded = seed_demo_data(store.as_ref(), store.as_ref(), 4).await.unwrap();
        assert!(seeded);

        let audit = AuditRecorder::new(store.clone());
        Harness {
            catalog: PartCatalog::new(store.clone(), audit.clone()),
            coordinator: StockMutationCoordinator::new(store.clone(), audit.clone()),
            audit,
            store,
        }
    }

    fn movement(part_id: PartId, movement_type: MovementType, quantity: i64, reference: &str) -> RecordMovement {
        RecordMovement {
            part_id,
            movement_type,
            quantity,
            reference: reference.to_string(),
            note: String::new(),
        }
    }

    async fn assert_ledger_matches(store: &InMemoryStore) {
        let ledger = store.list_movements(None).await.unwrap();
        for part in store.list_parts().await.unwrap() {
            assert_eq!(
                ledger_balance(&ledger, part.id),
                part.quantity,
                "ledger drift on {}",
                part.part_number()
            );
        }
    }

    #[tokio::test]
    async fn seeding_books_opening_balances() {
        let h = setup().await;
        assert_eq!(h.store.list_parts().await.unwrap().len(), 8);
        assert_ledger_matches(&h.store).await;

        let efis = h.store.list_movements(Some(EFIS_UNIT)).await.unwrap();
        assert_eq!(efis.len(), 1);
        assert_eq!(efis[0].reference, OPENING_BALANCE_REFERENCE);
        assert_eq!(efis[0].user_name.as_deref(), Some("Jane Martinez"));

        // Second run is a no-op.
        assert!(!seed_demo_data(h.store.as_ref(), h.store.as_ref(), 4).await.unwrap());
    }

    #[tokio::test]
    async fn receive_then_issue() {
        let h = setup().await;

        h.coordinator
            .record_movement(movement(EFIS_UNIT, MovementType::In, 5, "PO-2025-003"), CONTROLLER)
            .await
            .unwrap();
        assert_eq!(h.catalog.get(EFIS_UNIT).await.unwrap().quantity, 8);

        h.coordinator
            .record_movement(movement(EFIS_UNIT, MovementType::Out, 2, "WO-A320-044"), CONTROLLER)
            .await
            .unwrap();
        assert_eq!(h.catalog.get(EFIS_UNIT).await.unwrap().quantity, 6);

        let ledger = h.coordinator.list_movements(Some(EFIS_UNIT)).await.unwrap();
        let lines: Vec<_> = ledger.iter().map(|e| (e.movement_type, e.quantity)).collect();
        assert_eq!(
            lines,
            vec![(MovementType::Out, 2), (MovementType::In, 5), (MovementType::In, 3)]
        );
        assert!(ledger[0].id > ledger[1].id);

        let audit = h.audit.list().await.unwrap();
        assert_eq!(audit[0].action, "Issued 2× PN-3305-C — Ref: WO-A320-044");
        assert_eq!(audit[1].action, "Received 5× PN-3305-C — Ref: PO-2025-003");
        assert_ledger_matches(&h.store).await;
    }

    #[tokio::test]
    async fn issue_from_empty_bin_changes_nothing() {
        let h = setup().await;
        let audit_before = h.audit.list().await.unwrap().len();

        let err = h
            .coordinator
            .record_movement(
                movement(GENERATOR_CONTROL_UNIT, MovementType::Out, 1, "WO-A330-007"),
                CONTROLLER,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MovementError::Rejected(DomainError::InsufficientStock {
                requested: 1,
                available: 0
            })
        ));

        assert_eq!(h.catalog.get(GENERATOR_CONTROL_UNIT).await.unwrap().quantity, 0);
        assert!(h
            .coordinator
            .list_movements(Some(GENERATOR_CONTROL_UNIT))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(h.audit.list().await.unwrap().len(), audit_before);
    }

    #[tokio::test]
    async fn unknown_part_is_not_found() {
        let h = setup().await;
        let err = h
            .coordinator
            .record_movement(movement(PartId::new(999), MovementType::In, 1, "PO-1"), CONTROLLER)
            .await
            .unwrap_err();
        assert!(matches!(err, MovementError::Rejected(DomainError::NotFound)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_issues_never_oversell() {
        let h = setup().await;
        let mut attrs = h.catalog.get(EFIS_UNIT).await.unwrap().attributes;
        attrs.part_number = "PN-RACE-1".to_string();
        let part = h
            .catalog
            .create(
                NewPart {
                    attributes: attrs,
                    opening_quantity: 5,
                },
                CONTROLLER,
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let coordinator = h.coordinator.clone();
            let cmd = movement(part.id, MovementType::Out, 5, &format!("WO-{i}"));
            handles.push(tokio::spawn(async move {
                coordinator.record_movement(cmd, CONTROLLER).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(MovementError::Rejected(DomainError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(h.catalog.get(part.id).await.unwrap().quantity, 0);
        assert_ledger_matches(&h.store).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn ledger_lists_newest_commit_first() {
        let h = setup().await;
        let mut handles = Vec::new();
        for i in 0..12 {
            let coordinator = h.coordinator.clone();
            let cmd = movement(EFIS_UNIT, MovementType::In, 1, &format!("PO-{i}"));
            handles.push(tokio::spawn(async move {
                coordinator.record_movement(cmd, CONTROLLER).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let ledger = h.coordinator.list_movements(Some(EFIS_UNIT)).await.unwrap();
        assert_eq!(ledger.len(), 13);
        for pair in ledger.windows(2) {
            assert!(pair[0].id.get() > pair[1].id.get());
            assert!(pair[0].date >= pair[1].date);
        }
        assert_eq!(ledger.last().unwrap().reference, OPENING_BALANCE_REFERENCE);
    }

    #[tokio::test]
    async fn fault_after_ledger_append_rolls_back() {
        let h = setup().await;
        let ledger_before = h.coordinator.list_movements(None).await.unwrap();

        h.store.fail_next_movement_after_ledger_append();
        let err = h
            .coordinator
            .record_movement(movement(EFIS_UNIT, MovementType::In, 5, "PO-FAULT"), CONTROLLER)
            .await
            .unwrap_err();
        assert!(matches!(err, MovementError::Storage(StoreError::Backend(_))));

        assert_eq!(h.catalog.get(EFIS_UNIT).await.unwrap().quantity, 3);
        assert_eq!(h.coordinator.list_movements(None).await.unwrap(), ledger_before);

        // The fault is one-shot and ids stay dense.
        let entry = h
            .coordinator
            .record_movement(movement(EFIS_UNIT, MovementType::In, 5, "PO-RETRY"), CONTROLLER)
            .await
            .unwrap();
        assert_eq!(entry.id.get(), ledger_before[0].id.get() + 1);
        assert_ledger_matches(&h.store).await;
    }

    #[tokio::test]
    async fn reads_are_repeatable() {
        let h = setup().await;
        h.coordinator
            .record_movement(movement(EFIS_UNIT, MovementType::In, 1, "PO-1"), CONTROLLER)
            .await
            .unwrap();

        let first = h.coordinator.list_movements(None).await.unwrap();
        let second = h.coordinator.list_movements(None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(h.audit.list().await.unwrap(), h.audit.list().await.unwrap());
    }

    #[tokio::test]
    async fn update_keeps_quantity_on_the_ledger() {
        let h = setup().await;
        let mut attrs = h.catalog.get(EFIS_UNIT).await.unwrap().attributes;
        attrs.location = "Warehouse C".to_string();

        let err = h
            .catalog
            .update(EFIS_UNIT, attrs.clone(), Some(50), ADMIN)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Rejected(DomainError::Validation(_))));

        let part = h.catalog.update(EFIS_UNIT, attrs, Some(3), ADMIN).await.unwrap();
        assert_eq!(part.attributes.location, "Warehouse C");
        assert_eq!(part.quantity, 3);

        let audit = h.audit.list().await.unwrap();
        assert_eq!(audit[0].action, "Updated part PN-3305-C");
        assert_eq!(audit[0].user_name.as_deref(), Some("Admin User"));
    }

    #[tokio::test]
    async fn update_of_missing_part_is_not_found() {
        let h = setup().await;
        let attrs = h.catalog.get(EFIS_UNIT).await.unwrap().attributes;
        let err = h
            .catalog
            .update(PartId::new(404), attrs, None, ADMIN)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Rejected(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn credentials() {
        let h = setup().await;
        let verifier = CredentialVerifier::new(h.store.clone(), 4);

        let user = verifier.verify("controller", "ctrl1").await.unwrap();
        assert_eq!(user.id, CONTROLLER);
        assert_eq!(user.name, "Jane Martinez");

        assert!(matches!(
            verifier.verify("controller", "wrong").await,
            Err(CredentialError::InvalidCredentials)
        ));
        assert!(matches!(
            verifier.verify("nobody", "ctrl1").await,
            Err(CredentialError::InvalidCredentials)
        ));
        assert!(matches!(
            verifier.verify("", "").await,
            Err(CredentialError::InvalidCredentials)
        ));
        assert!(h.store.find_user_by_username("admin").await.unwrap().is_some());
    }

    struct BrokenAuditStore;

    #[async_trait]
    impl AuditStore for BrokenAuditStore {
        async fn append_audit(&self, _action: String, _actor: UserId) -> Result<AuditEntry, StoreError> {
            Err(StoreError::backend("audit table unavailable"))
        }

        async fn list_audit(&self) -> Result<Vec<AuditEntry>, StoreError> {
            Err(StoreError::backend("audit table unavailable"))
        }
    }

    #[tokio::test]
    async fn audit_failure_does_not_undo_the_movement() {
        let h = setup().await;
        let coordinator = StockMutationCoordinator::new(
            h.store.clone(),
            AuditRecorder::new(Arc::new(BrokenAuditStore)),
        );

        coordinator
            .record_movement(movement(EFIS_UNIT, MovementType::In, 2, "PO-9"), CONTROLLER)
            .await
            .unwrap();
        assert_eq!(h.catalog.get(EFIS_UNIT).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn report_reflects_the_seeded_catalog() {
        let h = setup().await;
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let report = h.catalog.report(today).await.unwrap();

        assert_eq!(report.total_parts, 8);
        assert_eq!(report.total_units, 12 + 3 + 8 + 2 + 45 + 1 + 500);
        let out: Vec<_> = report.out_of_stock.iter().map(|l| l.part_number.as_str()).collect();
        assert_eq!(out, vec!["PN-8820-E"]);
        let quarantined: Vec<_> = report.quarantined.iter().map(|l| l.part_number.as_str()).collect();
        assert_eq!(quarantined, vec!["PN-9901-G"]);
        let expiring: Vec<_> = report.expiring.iter().map(|l| l.part_number.as_str()).collect();
        assert_eq!(expiring, vec!["PN-4410-F"]);
    }
}
