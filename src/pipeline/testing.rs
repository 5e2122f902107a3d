// file: src/pipeline/testing.rs
// description: in-memory version control and generation fakes for pipeline tests
// reference: test doubles for the VersionControl and MessageGenerator seams

use crate::error::{PipelineError, Result};
use crate::generation::MessageGenerator;
use crate::models::{ChangeKind, FileChange, ModelName, RepoPath};
use crate::repository::VersionControl;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn git_error(command: &str, message: &str) -> PipelineError {
    PipelineError::Git {
        command: command.to_string(),
        message: message.to_string(),
    }
}

/// Hash derived from the committed paths so that runs are comparable
/// regardless of commit order.
fn fake_hash(paths: &[String]) -> String {
    let hex: String = paths
        .join(",")
        .bytes()
        .map(|b| format!("{:02x}", b))
        .collect();
    format!("{:0<40}", hex).chars().take(40).collect()
}

#[derive(Default)]
pub struct FakeVcs {
    valid: bool,
    changes: Vec<FileChange>,
    list_error: Option<String>,
    repo_diff: String,
    partially_staged: HashSet<String>,
    pre_staged: Vec<String>,
    failing_diff: HashSet<String>,
    failing_stage: HashSet<String>,
    failing_commit: HashSet<String>,
    staged: Mutex<Vec<String>>,
    unstaged: Mutex<Vec<String>>,
    commits: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeVcs {
    pub fn with_changes(changes: Vec<FileChange>) -> Self {
        Self {
            valid: true,
            changes,
            ..Self::default()
        }
    }

    pub fn with_paths(paths: &[&str]) -> Self {
        Self::with_changes(
            paths
                .iter()
                .map(|p| FileChange::new(*p, ChangeKind::Modified).with_line_counts(1, 0))
                .collect(),
        )
    }

    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_error = Some(message.to_string());
        self
    }

    pub fn with_repo_diff(mut self, diff: &str) -> Self {
        self.repo_diff = diff.to_string();
        self
    }

    /// Splits the file's change between the index and the work tree.
    pub fn with_partially_staged(mut self, path: &str) -> Self {
        self.partially_staged.insert(path.to_string());
        self
    }

    /// Marks a path as staged before the pipeline runs.
    pub fn with_pre_staged(mut self, path: &str) -> Self {
        self.pre_staged.push(path.to_string());
        self
    }

    pub fn failing_diff(mut self, path: &str) -> Self {
        self.failing_diff.insert(path.to_string());
        self
    }

    pub fn failing_stage(mut self, path: &str) -> Self {
        self.failing_stage.insert(path.to_string());
        self
    }

    pub fn failing_commit(mut self, path: &str) -> Self {
        self.failing_commit.insert(path.to_string());
        self
    }

    pub fn staged(&self) -> Vec<String> {
        self.staged.lock().unwrap().clone()
    }

    pub fn unstaged(&self) -> Vec<String> {
        self.unstaged.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<(String, Vec<String>)> {
        self.commits.lock().unwrap().clone()
    }
}

impl VersionControl for FakeVcs {
    async fn is_valid_repository(&self, _repo: &RepoPath) -> bool {
        self.valid
    }

    async fn list_changes(&self, _repo: &RepoPath) -> Result<Vec<FileChange>> {
        match &self.list_error {
            Some(message) => Err(git_error("status", message)),
            None => Ok(self.changes.clone()),
        }
    }

    async fn diff(&self, _repo: &RepoPath, file: Option<&str>, staged: bool) -> Result<String> {
        let Some(file) = file else {
            return Ok(self.repo_diff.clone());
        };

        if self.failing_diff.contains(file) {
            return Err(git_error("diff", "bad object"));
        }

        let diff = match (self.partially_staged.contains(file), staged) {
            (true, true) => format!("staged part of {}", file),
            (true, false) => format!("unstaged part of {}", file),
            (false, false) => format!("diff for {}", file),
            (false, true) => String::new(),
        };
        Ok(diff)
    }

    async fn change_diff(&self, repo: &RepoPath, file: &str) -> Result<String> {
        if !self.partially_staged.contains(file) {
            return self.diff(repo, Some(file), false).await;
        }
        Ok(format!("staged part of {}\nunstaged part of {}", file, file))
    }

    async fn staged_paths(&self, _repo: &RepoPath) -> Result<Vec<String>> {
        Ok(self.pre_staged.clone())
    }

    async fn stage(&self, _repo: &RepoPath, file: &str) -> Result<()> {
        if self.failing_stage.contains(file) {
            return Err(git_error("add", "index.lock exists"));
        }
        self.staged.lock().unwrap().push(file.to_string());
        Ok(())
    }

    async fn unstage(&self, _repo: &RepoPath, files: &[String]) -> Result<()> {
        self.unstaged.lock().unwrap().extend(files.iter().cloned());
        Ok(())
    }

    async fn commit(&self, _repo: &RepoPath, message: &str, paths: &[String]) -> Result<String> {
        if paths.iter().any(|p| self.failing_commit.contains(p)) {
            return Err(git_error("commit", "pre-commit hook failed"));
        }
        self.commits
            .lock()
            .unwrap()
            .push((message.to_string(), paths.to_vec()));
        Ok(fake_hash(paths))
    }
}

#[derive(Default)]
pub struct FakeGenerator {
    failing: HashSet<String>,
    panicking: bool,
    message: Option<String>,
    delays: HashMap<String, u64>,
    diffs: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panicking = true;
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, path: &str, millis: u64) -> Self {
        self.delays.insert(path.to_string(), millis);
        self
    }

    pub fn diffs_seen(&self) -> Vec<String> {
        self.diffs.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl MessageGenerator for FakeGenerator {
    async fn generate_message(
        &self,
        _model: &ModelName,
        file_path: &str,
        diff: &str,
        _kind: ChangeKind,
    ) -> Result<String> {
        if self.panicking {
            panic!("generator exploded on {}", file_path);
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.diffs.lock().unwrap().push(diff.to_string());

        let delay = self.delays.get(file_path).copied().unwrap_or(1);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(file_path) {
            return Err(PipelineError::Generation("backend unavailable".to_string()));
        }

        Ok(self
            .message
            .clone()
            .unwrap_or_else(|| format!("Update {}", file_path)))
    }
}
