// file: src/utils/validation.rs
// description: message truncation and path validation helpers
// reference: input validation patterns

use crate::error::{PipelineError, Result};
use crate::models::request::has_parent_component;
use std::path::Path;

const ELLIPSIS: &str = "...";

pub struct Validator;

impl Validator {
    /// File paths handed to git must stay inside the repository.
    pub fn validate_relative_file(path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(PipelineError::Validation(
                "file path must not be empty".to_string(),
            ));
        }

        let candidate = Path::new(path);
        if candidate.is_absolute() || path.starts_with('/') {
            return Err(PipelineError::Validation(format!(
                "file path must be relative to the repository: {}",
                path
            )));
        }

        if has_parent_component(candidate) {
            return Err(PipelineError::Validation(format!(
                "file path must not contain '..': {}",
                path
            )));
        }

        Ok(())
    }

    /// Cuts a message longer than `max_length` characters down to
    /// `max_length - 3` characters followed by `...`.
    pub fn truncate_message(message: &str, max_length: usize) -> String {
        if message.chars().count() <= max_length {
            return message.to_string();
        }

        let keep = max_length.saturating_sub(ELLIPSIS.len());
        let mut truncated: String = message.chars().take(keep).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    }
}
