// file: src/pipeline/aggregate.rs
// description: order-preserving aggregation of processing unit outcomes
// reference: internal pipeline stages

use crate::models::{ProcessedFile, ProcessingError, ProcessingResult};

pub type UnitOutcome = std::result::Result<ProcessedFile, ProcessingError>;

/// Splits per-file outcomes, given in discovery order, into successes and
/// errors. Relative order inside each list is kept.
pub fn aggregate(outcomes: Vec<UnitOutcome>) -> ProcessingResult {
    let mut processed_files = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(file) => processed_files.push(file),
            Err(error) => errors.push(error),
        }
    }

    let total_commits = processed_files
        .iter()
        .filter(|file| file.commit_hash.is_some())
        .count();

    ProcessingResult {
        processed_files,
        errors,
        total_commits,
    }
}

/// Batch runs produce one commit or none at all.
pub fn aggregate_batch(outcome: std::result::Result<Vec<ProcessedFile>, ProcessingError>) -> ProcessingResult {
    match outcome {
        Ok(processed_files) => ProcessingResult {
            total_commits: usize::from(!processed_files.is_empty()),
            processed_files,
            errors: Vec::new(),
        },
        Err(error) => ProcessingResult::failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorStage;
    use pretty_assertions::assert_eq;

    fn ok(path: &str) -> UnitOutcome {
        Ok(ProcessedFile {
            path: path.to_string(),
            commit_message: format!("Update {}", path),
            commit_hash: Some("abcdef0".to_string()),
            duration_ms: 1,
        })
    }

    fn err(path: &str) -> UnitOutcome {
        Err(ProcessingError::new(path, ErrorStage::Diff, "no diff"))
    }

    #[test]
    fn test_aggregate_preserves_relative_order() {
        let result = aggregate(vec![ok("a"), err("b"), ok("c"), err("d"), ok("e")]);

        let processed: Vec<_> = result.processed_files.iter().map(|f| f.path.as_str()).collect();
        let failed: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(processed, vec!["a", "c", "e"]);
        assert_eq!(failed, vec!["b", "d"]);
        assert_eq!(result.total_commits, 3);
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(Vec::new()), ProcessingResult::empty());
    }

    #[test]
    fn test_aggregate_batch() {
        let files = vec![ok("a").unwrap(), ok("b").unwrap()];
        let success = aggregate_batch(Ok(files));
        assert_eq!(success.total_commits, 1);
        assert_eq!(success.processed_files.len(), 2);

        let failure = aggregate_batch(Err(ProcessingError::new("/repo", ErrorStage::Commit, "hook failed")));
        assert_eq!(failure.total_commits, 0);
        assert!(failure.processed_files.is_empty());
        assert_eq!(failure.errors.len(), 1);
    }
}
