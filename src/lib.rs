// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod generation;
pub mod mcp;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod utils;

pub use config::{Config, GenerationConfig, GitConfig, PipelineConfig, ServerConfig};
pub use error::{PipelineError, Result};
pub use generation::{ChatCompletionClient, MessageGenerator};
pub use models::{
    ChangeKind, ErrorStage, FileChange, ModelName, ProcessedFile, ProcessingError,
    ProcessingRequest, ProcessingResult, RepoPath,
};
pub use pipeline::{ChangePipeline, ConcurrencyGate, PipelineStats, ProgressTracker};
pub use repository::{GitCli, VersionControl};
pub use utils::{OperationTimer, Validator};
