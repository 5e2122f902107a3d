// file: src/models/request.rs
// description: validated identifiers and the per-invocation processing request
// reference: internal data structures

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

const MAX_MODEL_NAME_LEN: usize = 128;

/// Repository location that has passed path-safety checks.
/// It says nothing about whether a repository actually lives there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoPath(PathBuf);

impl RepoPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::Validation(
                "repository path must not be empty".to_string(),
            ));
        }

        if trimmed.contains('\0') {
            return Err(PipelineError::Validation(
                "repository path contains a NUL byte".to_string(),
            ));
        }

        let path = PathBuf::from(trimmed);
        if has_parent_component(&path) {
            return Err(PipelineError::Validation(format!(
                "repository path must not contain '..': {}",
                trimmed
            )));
        }

        Ok(Self(path))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for RepoPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Generation backend model identifier, e.g. `llama3.2:latest` or `openai/gpt-oss-120b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModelName(String);

impl ModelName {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(PipelineError::Validation(
                "model name must not be empty".to_string(),
            ));
        }

        if raw.chars().count() > MAX_MODEL_NAME_LEN {
            return Err(PipelineError::Validation(format!(
                "model name longer than {} characters",
                MAX_MODEL_NAME_LEN
            )));
        }

        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '/')))
        {
            return Err(PipelineError::Validation(format!(
                "model name contains invalid character {:?}",
                bad
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub repo_path: RepoPath,
    pub model: ModelName,
    pub commit_individually: bool,
}

impl ProcessingRequest {
    pub fn new(repo_path: RepoPath, model: ModelName, commit_individually: bool) -> Self {
        Self {
            repo_path,
            model,
            commit_individually,
        }
    }
}

pub(crate) fn has_parent_component(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}
