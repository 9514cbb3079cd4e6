//! HTTP API: inbound triggers, unit queries and service wiring.

pub mod app;
pub mod middleware;
