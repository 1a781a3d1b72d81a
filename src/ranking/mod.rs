//! Course ranking: the engine and its CSV ingestion path

pub mod engine;
pub mod ingest;

pub use engine::RankingEngine;
pub use ingest::{read_first_column, validate_upload_name};
