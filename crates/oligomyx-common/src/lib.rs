//! oligomyx-common: Shared types, errors, and configuration used across all Oligomyx crates.

pub mod error;
pub mod entities;
pub mod report;
pub mod pipeline_config;

// Re-export commonly used types
pub use error::{LookupFailure, LookupResult, OligomyxError, Result};
pub use entities::PdbId;
pub use pipeline_config::PipelineConfig;
