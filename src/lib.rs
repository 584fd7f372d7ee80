pub mod analysis;
pub mod api;
pub mod archive;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod service;
pub mod workers;

pub use error::{AnalyzerError, Result};
pub use service::AnalyzerService;
