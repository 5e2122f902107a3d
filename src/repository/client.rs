// file: src/repository/client.rs
// description: version control operations consumed by the change pipeline
// reference: internal trait seam between the pipeline and git

use crate::error::Result;
use crate::models::{FileChange, RepoPath};
use std::future::Future;

/// Operations the pipeline needs from a version control system.
///
/// Every fallible operation reports its failure as a [`crate::PipelineError`];
/// the pipeline tags it with the stage it was running.
pub trait VersionControl: Send + Sync {
    fn is_valid_repository(&self, repo: &RepoPath) -> impl Future<Output = bool> + Send;

    /// Uncommitted changes in discovery order, one entry per path.
    fn list_changes(&self, repo: &RepoPath)
    -> impl Future<Output = Result<Vec<FileChange>>> + Send;

    /// Unified diff of the whole repository, or of one file when `file` is set.
    fn diff(
        &self,
        repo: &RepoPath,
        file: Option<&str>,
        staged: bool,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Everything a commit of `file` would record: the work tree against
    /// `HEAD`, staged and unstaged parts together.
    fn change_diff(&self, repo: &RepoPath, file: &str)
    -> impl Future<Output = Result<String>> + Send;

    /// Paths whose index entry differs from `HEAD`.
    fn staged_paths(&self, repo: &RepoPath) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn stage(&self, repo: &RepoPath, file: &str) -> impl Future<Output = Result<()>> + Send;

    fn unstage(&self, repo: &RepoPath, files: &[String]) -> impl Future<Output = Result<()>> + Send;

    /// Commits the given paths only and returns the new commit hash.
    /// Content staged for other paths is left in the index.
    fn commit(
        &self,
        repo: &RepoPath,
        message: &str,
        paths: &[String],
    ) -> impl Future<Output = Result<String>> + Send;
}
