//! Pipeline orchestration.

mod orchestrator;

pub use orchestrator::{Pipeline, PipelineConfig, EXIT_INTERRUPTED};
