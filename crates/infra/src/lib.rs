//! Infrastructure layer: persistence, trigger execution, read models, config.

pub mod config;
pub mod projections;
pub mod read_model;
pub mod repository;
pub mod workers;
pub mod workflow;

mod integration_tests;

pub use config::{ConfigError, ServiceConfig, StoreConfig};
pub use repository::{
    InMemoryInventoryRepository, InventoryRepository, PostgresInventoryRepository, RepositoryError,
};
pub use workflow::{InventoryEnvelope, InventoryWorkflow, Outcome, WorkflowError};
