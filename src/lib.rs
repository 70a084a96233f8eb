pub mod api;
pub mod config;
pub mod database;
pub mod datasets;
pub mod indexer;
pub mod query;
pub mod store;
pub mod telemetry;
pub mod validation;
