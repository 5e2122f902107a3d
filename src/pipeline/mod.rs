// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod aggregate;
mod gate;
mod orchestrator;
mod processor;
mod progress;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{UnitOutcome, aggregate, aggregate_batch};
pub use gate::{ConcurrencyGate, RepositoryLocks};
pub use orchestrator::{ChangePipeline, INVALID_REPOSITORY};
pub use processor::FileProcessor;
pub use progress::{PipelineStats, ProgressTracker};
