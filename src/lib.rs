//! Farm biosecurity management service.
//!
//! The core is the biosecurity risk scoring model: per-farm-type question
//! catalogs, a pure scoring engine, an append-only assessment store, and an
//! aggregation reducer behind the authority dashboard. The surrounding
//! modules are typed record families persisted through the [`store`]
//! key-value boundary.

pub mod alerts;
pub mod analytics;
pub mod assessment;
pub mod auth;
pub mod community;
pub mod config;
pub mod error;
pub mod records;
pub mod seed;
pub mod store;
pub mod telemetry;
