//! Integration tests for the full trigger pipeline.
//!
//! Tests: Trigger → Workflow → Repository → EventBus → Projection → ReadModel
//!
//! Verifies:
//! - Saved changes reach the read model through the bus
//! - Save/reload reproduces status, quarantines and history exactly
//! - Concurrent writers on one unit never lose an update

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use unitrack_core::UnitKey;
    use unitrack_events::InMemoryEventBus;
    use unitrack_inventory::InventoryStatus;

    use crate::projections::{UnitStatusProjection, UnitStatusView};
    use crate::read_model::InMemoryReadModelStore;
    use crate::repository::{InMemoryInventoryRepository, InventoryRepository};
    use crate::workers::{ProjectionWorker, WorkerHandle};
    use crate::workflow::{
        ImportedQuarantine, InventoryEnvelope, InventoryWorkflow, ProductImported, QuarantineAction,
        QuarantineRequested, UnitReceived,
    };

    type Repo = Arc<InMemoryInventoryRepository>;
    type Bus = Arc<InMemoryEventBus<InventoryEnvelope>>;
    type Projection = UnitStatusProjection<Arc<InMemoryReadModelStore<UnitKey, UnitStatusView>>>;

    const UNIT: &str = "W036825014001";
    const PRODUCT: &str = "E0869V00";

    fn setup() -> (Arc<InventoryWorkflow<Repo, Bus>>, Arc<Projection>, WorkerHandle) {
        let repo: Repo = Arc::new(InMemoryInventoryRepository::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let projection = Arc::new(UnitStatusProjection::new(Arc::new(InMemoryReadModelStore::new())));

        // Subscribe BEFORE any trigger runs.
        let p = projection.clone();
        let worker = ProjectionWorker::spawn("unit-status-test", &bus, move |env: InventoryEnvelope| {
            p.apply_envelope(&env).map(|_| ())
        })
        .unwrap();

        let workflow = Arc::new(InventoryWorkflow::new(repo, bus).with_max_retries(16));
        (workflow, projection, worker)
    }

    fn key() -> UnitKey {
        UnitKey::parse(UNIT, PRODUCT).unwrap()
    }

    fn import(location: &str) -> ProductImported {
        ProductImported {
            unit_number: UNIT.to_string(),
            product_code: PRODUCT.to_string(),
            location: location.to_string(),
            status: InventoryStatus::InTransit,
            expiration_date: None,
            is_labeled: true,
            is_licensed: true,
            attributes: Default::default(),
            quarantines: vec![],
        }
    }

    fn add_quarantine(extern_id: i64) -> QuarantineRequested {
        QuarantineRequested {
            unit_number: UNIT.to_string(),
            product_code: PRODUCT.to_string(),
            action: QuarantineAction::Add,
            extern_id,
            reason: "UNDER_INVESTIGATION".to_string(),
            comments: format!("hold {extern_id}"),
        }
    }

    /// Poll the projection until `check` holds or a second passes.
    fn wait_for(projection: &Projection, check: impl Fn(&UnitStatusView) -> bool) -> UnitStatusView {
        for _ in 0..100 {
            if let Some(view) = projection.get(&key()) {
                if check(&view) {
                    return view;
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("read model did not reach the expected state");
    }

    #[tokio::test]
    async fn triggers_update_read_model() {
        let (workflow, projection, worker) = setup();

        workflow.product_imported(&import("DOCK")).await.unwrap();
        workflow.quarantine_requested(&add_quarantine(1)).await.unwrap();
        workflow
            .unit_received(&UnitReceived {
                unit_number: UNIT.to_string(),
                product_code: PRODUCT.to_string(),
                location: "LOCATION_1".to_string(),
                has_quarantine: true,
            })
            .await
            .unwrap();

        let view = wait_for(&projection, |v| v.version == 3);
        assert_eq!(view.status, InventoryStatus::Available);
        assert_eq!(view.location, "LOCATION_1");
        assert_eq!(view.open_quarantines, 1);
        assert!(view.quarantined);

        worker.shutdown();
    }

    #[tokio::test]
    async fn save_and_reload_reproduces_unit() {
        let (workflow, _projection, worker) = setup();
        let mut trigger = import("DOCK");
        trigger.quarantines = vec![
            ImportedQuarantine {
                extern_id: 1,
                reason: "Contamination".to_string(),
                comments: "Detected contamination".to_string(),
            },
            ImportedQuarantine {
                extern_id: 2,
                reason: "OTHER".to_string(),
                comments: "Other Comment".to_string(),
            },
        ];

        let outcome = workflow.product_imported(&trigger).await.unwrap();
        let published = outcome.envelope().unwrap().payload().unit.clone();
        let reloaded = workflow.repository().find(&key()).await.unwrap().unwrap();

        assert_eq!(reloaded.unit().status(), published.status);
        assert_eq!(reloaded.unit().quarantines(), &published.quarantines[..]);
        assert_eq!(reloaded.unit().histories().len(), 1);
        assert_eq!(reloaded.unit().histories()[0].status, InventoryStatus::InTransit);

        worker.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_quarantines_are_all_kept() {
        let (workflow, projection, worker) = setup();
        workflow.product_imported(&import("DOCK")).await.unwrap();

        let mut tasks = Vec::new();
        for id in 1..=8 {
            let wf = workflow.clone();
            tasks.push(tokio::spawn(async move { wf.quarantine_requested(&add_quarantine(id)).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let agg = workflow.get(&key()).await.unwrap();
        assert_eq!(agg.unit().quarantines().len(), 8);
        assert_eq!(agg.unit().status(), InventoryStatus::Quarantined);
        // Only the first hold records a transition.
        assert_eq!(agg.unit().histories().len(), 1);

        let view = wait_for(&projection, |v| v.version == 9);
        assert_eq!(view.open_quarantines, 8);

        worker.shutdown();
    }
}
