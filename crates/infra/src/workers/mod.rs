//! Background workers driven by bus subscriptions.

pub mod projection_worker;

pub use projection_worker::{ProjectionWorker, WorkerHandle, WorkerStats};
