use std::sync::Arc;

use anyhow::Context;

use unitrack_core::UnitKey;
use unitrack_events::InMemoryEventBus;
use unitrack_infra::config::{ServiceConfig, StoreConfig};
use unitrack_infra::projections::{UnitStatusProjection, UnitStatusView};
use unitrack_infra::read_model::InMemoryReadModelStore;
use unitrack_infra::workers::{ProjectionWorker, WorkerHandle};
use unitrack_infra::{
    InMemoryInventoryRepository, InventoryEnvelope, InventoryRepository, InventoryWorkflow,
    PostgresInventoryRepository,
};

pub type SharedRepository = Arc<dyn InventoryRepository>;
pub type SharedBus = Arc<InMemoryEventBus<InventoryEnvelope>>;
pub type Workflow = InventoryWorkflow<SharedRepository, SharedBus>;
pub type StatusProjection = UnitStatusProjection<Arc<InMemoryReadModelStore<UnitKey, UnitStatusView>>>;

/// Everything the HTTP handlers need, built once at startup.
pub struct AppServices {
    pub workflow: Workflow,
    pub projection: Arc<StatusProjection>,
    _projection_worker: WorkerHandle,
}

/// Wire repository, bus, projection and workflow according to `config`.
pub async fn build_services(config: &ServiceConfig) -> anyhow::Result<AppServices> {
    let repository: SharedRepository = match &config.store {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory inventory repository");
            Arc::new(InMemoryInventoryRepository::new())
        }
        StoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let repo = PostgresInventoryRepository::connect(database_url, *max_connections)
                .await
                .context("failed to connect to Postgres")?;
            repo.ensure_schema()
                .await
                .context("failed to prepare inventory_units table")?;
            tracing::info!(max_connections, "using Postgres inventory repository");
            Arc::new(repo)
        }
    };

    let bus: SharedBus = Arc::new(InMemoryEventBus::new());
    let projection = Arc::new(UnitStatusProjection::new(Arc::new(InMemoryReadModelStore::new())));

    // Subscribe before any trigger can publish.
    let worker_projection = projection.clone();
    let projection_worker = ProjectionWorker::spawn("unit-status-projection", &bus, move |env: InventoryEnvelope| {
        worker_projection.apply_envelope(&env).map(|_| ())
    })
    .context("failed to start projection worker")?;

    let workflow = InventoryWorkflow::new(repository, bus).with_max_retries(config.save_max_retries);

    Ok(AppServices {
        workflow,
        projection,
        _projection_worker: projection_worker,
    })
}
