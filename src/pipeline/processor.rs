// file: src/pipeline/processor.rs
// description: diff, generate, stage and commit units for single files and whole change sets
// reference: converts repository changes into commits, tagging failures by stage

use crate::error::PipelineError;
use crate::generation::MessageGenerator;
use crate::models::{
    ChangeKind, ErrorStage, FileChange, ModelName, ProcessedFile, ProcessingError, RepoPath,
};
use crate::pipeline::aggregate::UnitOutcome;
use crate::repository::VersionControl;
use crate::utils::Validator;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type StageResult<T> = std::result::Result<T, ProcessingError>;

trait AtStage<T> {
    fn at_stage(self, stage: ErrorStage, path: &str) -> StageResult<T>;
}

impl<T> AtStage<T> for std::result::Result<T, PipelineError> {
    fn at_stage(self, stage: ErrorStage, path: &str) -> StageResult<T> {
        self.map_err(|e| ProcessingError::new(path, stage, e.to_string()))
    }
}

pub struct FileProcessor<'a, V, G> {
    vcs: &'a V,
    generator: &'a G,
    repo_lock: Arc<Mutex<()>>,
    max_message_length: usize,
}

impl<'a, V, G> FileProcessor<'a, V, G>
where
    V: VersionControl,
    G: MessageGenerator,
{
    pub fn new(vcs: &'a V, generator: &'a G, repo_lock: Arc<Mutex<()>>, max_message_length: usize) -> Self {
        Self {
            vcs,
            generator,
            repo_lock,
            max_message_length,
        }
    }

    /// Runs one change through diff, generation, staging and commit.
    /// Yields exactly one processed file or one error.
    pub async fn process(&self, repo: &RepoPath, model: &ModelName, change: &FileChange) -> UnitOutcome {
        let start = Instant::now();
        let path = change.path.as_str();

        let diff = self.read_diff(repo, path).await.at_stage(ErrorStage::Diff, path)?;

        let raw_message = self
            .generator
            .generate_message(model, path, &diff, change.kind)
            .await
            .at_stage(ErrorStage::Generation, path)?;
        let commit_message = Validator::truncate_message(&raw_message, self.max_message_length);

        let commit_hash = {
            let _guard = self.repo_lock.lock().await;

            self.vcs
                .stage(repo, path)
                .await
                .at_stage(ErrorStage::Stage, path)?;

            self.vcs
                .commit(repo, &commit_message, &commit_paths(change))
                .await
                .at_stage(ErrorStage::Commit, path)?
        };

        info!("Committed {} as {}", path, commit_hash);

        Ok(ProcessedFile {
            path: change.path.clone(),
            commit_message,
            commit_hash: Some(commit_hash),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Commits every change at once. Any failure fails the whole batch and
    /// leaves nothing staged by this call behind.
    pub async fn process_batch(
        &self,
        repo: &RepoPath,
        model: &ModelName,
        changes: &[FileChange],
    ) -> StageResult<Vec<ProcessedFile>> {
        let start = Instant::now();
        let repo_label = repo.to_string();

        let mut combined = String::new();
        for change in changes {
            let diff = self
                .read_diff(repo, &change.path)
                .await
                .at_stage(ErrorStage::Diff, &change.path)?;
            combined.push_str(&format!("### {} ({})\n{}\n", change.path, change.kind, diff));
        }

        let label = changes
            .iter()
            .map(|c| c.path.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let raw_message = self
            .generator
            .generate_message(model, &label, &combined, batch_kind(changes))
            .await
            .at_stage(ErrorStage::Generation, &repo_label)?;
        let commit_message = Validator::truncate_message(&raw_message, self.max_message_length);

        let paths: Vec<String> = changes.iter().flat_map(commit_paths).collect();

        let commit_hash = {
            let _guard = self.repo_lock.lock().await;

            // paths staged before this call keep their index entries on rollback
            let already_staged: HashSet<String> = self
                .vcs
                .staged_paths(repo)
                .await
                .at_stage(ErrorStage::Stage, &repo_label)?
                .into_iter()
                .collect();

            let mut staged = Vec::with_capacity(changes.len());
            for change in changes {
                if let Err(e) = self.vcs.stage(repo, &change.path).await {
                    self.rollback(repo, &staged).await;
                    return Err(ProcessingError::new(&change.path, ErrorStage::Stage, e.to_string()));
                }
                if !already_staged.contains(&change.path) {
                    staged.push(change.path.clone());
                }
            }

            match self.vcs.commit(repo, &commit_message, &paths).await {
                Ok(hash) => hash,
                Err(e) => {
                    self.rollback(repo, &staged).await;
                    return Err(ProcessingError::new(&repo_label, ErrorStage::Commit, e.to_string()));
                }
            }
        };

        info!("Committed {} files in {} as {}", changes.len(), repo, commit_hash);

        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(changes
            .iter()
            .map(|change| ProcessedFile {
                path: change.path.clone(),
                commit_message: commit_message.clone(),
                commit_hash: Some(commit_hash.clone()),
                duration_ms,
            })
            .collect())
    }

    async fn read_diff(&self, repo: &RepoPath, path: &str) -> crate::Result<String> {
        let diff = self.vcs.change_diff(repo, path).await?;
        debug!("Read {} byte diff for {}", diff.len(), path);
        Ok(diff)
    }

    async fn rollback(&self, repo: &RepoPath, staged: &[String]) {
        if let Err(e) = self.vcs.unstage(repo, staged).await {
            warn!("Failed to unstage {} file(s) after batch failure: {}", staged.len(), e);
        }
    }
}

/// Paths a commit for this change must include. Renames also drop the old path.
fn commit_paths(change: &FileChange) -> Vec<String> {
    let mut paths = vec![change.path.clone()];
    if change.kind == ChangeKind::Renamed
        && let Some(old) = &change.old_path
    {
        paths.push(old.clone());
    }
    paths
}

fn batch_kind(changes: &[FileChange]) -> ChangeKind {
    match changes.first() {
        Some(first) if changes.iter().all(|c| c.kind == first.kind) => first.kind,
        _ => ChangeKind::Modified,
    }
}
