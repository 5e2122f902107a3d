// file: src/models/result.rs
// description: per-file outcomes and the aggregated result of one pipeline run
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::fmt;

const SHORT_HASH_LEN: usize = 7;

/// Pipeline phase at which a processing unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStage {
    Status,
    Diff,
    Generation,
    Stage,
    Commit,
}

impl fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Status => "status",
            Self::Diff => "diff",
            Self::Generation => "generation",
            Self::Stage => "stage",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub path: String,
    pub commit_message: String,
    pub commit_hash: Option<String>,
    pub duration_ms: u64,
}

impl ProcessedFile {
    pub fn short_hash(&self) -> Option<&str> {
        self.commit_hash
            .as_deref()
            .map(|hash| hash.get(..SHORT_HASH_LEN).unwrap_or(hash))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub path: String,
    pub message: String,
    pub stage: ErrorStage,
}

impl ProcessingError {
    pub fn new(path: impl Into<String>, stage: ErrorStage, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            stage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub processed_files: Vec<ProcessedFile>,
    pub errors: Vec<ProcessingError>,
    pub total_commits: usize,
}

impl ProcessingResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result of a run that failed as a whole before any unit ran.
    pub fn failed(error: ProcessingError) -> Self {
        Self {
            processed_files: Vec::new(),
            errors: vec![error],
            total_commits: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processed_files.is_empty() && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn format_summary(&self) -> String {
        if self.is_empty() {
            return "No changes to commit".to_string();
        }

        let mut output = format!(
            "Processed {} file(s): {} commit(s), {} error(s)\n",
            self.processed_files.len(),
            self.total_commits,
            self.errors.len()
        );

        if !self.processed_files.is_empty() {
            output.push_str("\nCommitted:\n");
            for file in &self.processed_files {
                output.push_str(&format!(
                    "  - {} [{}] ({} ms): {}\n",
                    file.path,
                    file.short_hash().unwrap_or("-------"),
                    file.duration_ms,
                    file.commit_message
                ));
            }
        }

        if !self.errors.is_empty() {
            output.push_str("\nErrors:\n");
            for error in &self.errors {
                output.push_str(&format!(
                    "  - {} ({}): {}\n",
                    error.path, error.stage, error.message
                ));
            }
        }

        output
    }
}
