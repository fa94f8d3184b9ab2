pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod parser;
pub mod sky;
pub mod types;

// Layered boundaries: use cases and ports, plus their adapters
pub mod app;
pub mod infra;
