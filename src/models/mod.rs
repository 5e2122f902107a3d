// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod change;
pub mod request;
pub mod result;

pub use change::{ChangeKind, FileChange};
pub use request::{ModelName, ProcessingRequest, RepoPath};
pub use result::{ErrorStage, ProcessedFile, ProcessingError, ProcessingResult};
