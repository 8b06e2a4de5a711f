pub mod config;
pub mod engine;
pub mod errors;
pub mod fixtures;
pub mod judge;
pub mod metrics_api;
pub mod model;
pub mod providers;
pub mod report;
pub mod safety;
pub mod storage;
