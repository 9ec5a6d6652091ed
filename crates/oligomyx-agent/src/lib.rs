//! oligomyx-agent: the command-line driver around the pipeline stages.

pub mod cli;
pub mod config;
pub mod output;
pub mod pipeline;

pub use pipeline::{run_pipeline, PipelineOutcome, RunContext};
