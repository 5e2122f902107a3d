// file: src/repository/git.rs
// description: VersionControl implementation driving the git command line
// reference: https://git-scm.com/docs, https://docs.rs/gix

use crate::config::GitConfig;
use crate::error::{PipelineError, Result};
use crate::models::{FileChange, RepoPath};
use crate::repository::client::VersionControl;
use crate::repository::status::{self, COMMIT_HASH};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// `git diff --no-index` exits with 1 when the compared files differ.
const DIFF_HAS_CHANGES: i32 = 1;

/// `git rev-parse --verify -q` exits with 1 when the revision does not exist.
const REVISION_MISSING: i32 = 1;

#[derive(Debug, Clone)]
pub struct GitCli {
    config: GitConfig,
}

impl GitCli {
    pub fn new(config: GitConfig) -> Self {
        Self { config }
    }

    async fn run(&self, repo: &RepoPath, args: &[&str], accepted_codes: &[i32]) -> Result<String> {
        let command = args.first().copied().unwrap_or_default().to_string();
        debug!("git {} (in {})", args.join(" "), repo);

        let mut cmd = Command::new(&self.config.binary);
        cmd.args(["--no-pager", "-c", "color.ui=false", "-c", "core.quotepath=false"])
            .args(args)
            .current_dir(repo.as_path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let limit = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(limit, cmd.output()).await {
            Ok(result) => result.map_err(|e| PipelineError::Git {
                command: command.clone(),
                message: format!("failed to spawn {}: {}", self.config.binary, e),
            })?,
            Err(_) => {
                warn!("git {} timed out in {}", command, repo);
                return Err(PipelineError::GitTimeout {
                    command,
                    secs: self.config.timeout_secs,
                });
            }
        };

        let accepted = output
            .status
            .code()
            .is_some_and(|code| accepted_codes.contains(&code));

        if output.status.success() || accepted {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            text => text.to_string(),
        };

        Err(PipelineError::Git { command, message })
    }

    async fn has_head(&self, repo: &RepoPath) -> Result<bool> {
        let head = self
            .run(repo, &["rev-parse", "--verify", "-q", "HEAD"], &[REVISION_MISSING])
            .await?;
        Ok(!head.trim().is_empty())
    }

    /// Whole file as an addition; untracked files only show up against /dev/null.
    async fn new_file_diff(&self, repo: &RepoPath, file: &str) -> Result<String> {
        self.run(
            repo,
            &["diff", "--no-index", "--", "/dev/null", file],
            &[DIFF_HAS_CHANGES],
        )
        .await
    }

    async fn worktree_file_exists(&self, repo: &RepoPath, file: &str) -> bool {
        let path: PathBuf = repo.as_path().join(file);
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }
}

impl VersionControl for GitCli {
    async fn is_valid_repository(&self, repo: &RepoPath) -> bool {
        let path = repo.as_path().to_path_buf();
        match tokio::task::spawn_blocking(move || gix::open(path).map(|_| ())).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!("{} is not a repository: {}", repo, e);
                false
            }
            Err(e) => {
                warn!("Repository check task failed: {}", e);
                false
            }
        }
    }

    async fn list_changes(&self, repo: &RepoPath) -> Result<Vec<FileChange>> {
        let porcelain = self
            .run(
                repo,
                &["status", "--porcelain=v1", "-z", "--untracked-files=all"],
                &[],
            )
            .await?;
        let mut changes = status::parse_porcelain(&porcelain);

        if changes.is_empty() {
            return Ok(changes);
        }

        let unstaged = self
            .run(repo, &["diff", "--numstat", "-z", "--no-renames"], &[])
            .await?;
        // no staged numstat before the first commit
        let staged = self
            .run(repo, &["diff", "--cached", "--numstat", "-z", "--no-renames"], &[])
            .await
            .unwrap_or_default();

        status::apply_line_counts(
            &mut changes,
            &[status::parse_numstat(&unstaged), status::parse_numstat(&staged)],
        );

        Ok(changes)
    }

    async fn diff(&self, repo: &RepoPath, file: Option<&str>, staged: bool) -> Result<String> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--cached");
        }
        if let Some(file) = file {
            args.extend(["--", file]);
        }

        let output = self.run(repo, &args, &[]).await?;

        if let Some(file) = file
            && !staged
            && output.trim().is_empty()
            && self.worktree_file_exists(repo, file).await
        {
            return self.new_file_diff(repo, file).await;
        }

        Ok(output)
    }

    async fn change_diff(&self, repo: &RepoPath, file: &str) -> Result<String> {
        let exists = self.worktree_file_exists(repo, file).await;

        if !self.has_head(repo).await? {
            // unborn branch: the commit records the file as it is now
            return if exists {
                self.new_file_diff(repo, file).await
            } else {
                self.run(repo, &["diff", "--cached", "--", file], &[]).await
            };
        }

        let output = self.run(repo, &["diff", "HEAD", "--", file], &[]).await?;
        if output.trim().is_empty() && exists {
            return self.new_file_diff(repo, file).await;
        }

        Ok(output)
    }

    async fn staged_paths(&self, repo: &RepoPath) -> Result<Vec<String>> {
        let names = self
            .run(repo, &["diff", "--cached", "--name-only", "-z"], &[])
            .await?;
        Ok(names
            .split('\0')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn stage(&self, repo: &RepoPath, file: &str) -> Result<()> {
        if self.worktree_file_exists(repo, file).await {
            self.run(repo, &["add", "-A", "--", file], &[]).await?;
        } else {
            // deleted in the work tree, possibly already removed from the index
            self.run(
                repo,
                &["rm", "--cached", "-r", "-q", "--ignore-unmatch", "--", file],
                &[],
            )
            .await?;
        }
        Ok(())
    }

    async fn unstage(&self, repo: &RepoPath, files: &[String]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let mut args = vec!["reset", "-q", "--"];
        args.extend(files.iter().map(String::as_str));
        self.run(repo, &args, &[]).await?;
        Ok(())
    }

    async fn commit(&self, repo: &RepoPath, message: &str, paths: &[String]) -> Result<String> {
        let mut args = vec!["commit", "-q", "-m", message, "--only", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(repo, &args, &[]).await?;

        let head = self.run(repo, &["rev-parse", "HEAD"], &[]).await?;
        let hash = head.trim();
        if !COMMIT_HASH.is_match(hash) {
            return Err(PipelineError::Git {
                command: "rev-parse".to_string(),
                message: format!("unexpected HEAD value {:?}", hash),
            });
        }

        Ok(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::ChangeKind;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn cli() -> GitCli {
        GitCli::new(Config::default_config().git)
    }

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn init_repo() -> (TempDir, RepoPath) {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(dir.path(), &["config", "user.email", "dev@example.com"]);
        git(dir.path(), &["config", "user.name", "Dev"]);
        git(dir.path(), &["config", "commit.gpgsign", "false"]);
        let repo = RepoPath::parse(dir.path().to_str().unwrap()).unwrap();
        (dir, repo)
    }

    fn commit_files(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-q", "-m", "base"]);
    }

    #[tokio::test]
    async fn test_initialized_directory_is_a_repository() {
        let (_dir, repo) = init_repo();
        assert!(cli().is_valid_repository(&repo).await);
    }

    #[tokio::test]
    async fn test_plain_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let repo = RepoPath::parse(dir.path().to_str().unwrap()).unwrap();
        assert!(!cli().is_valid_repository(&repo).await);
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_a_repository() {
        let repo = RepoPath::parse("/nonexistent/git_autocommit/repo").unwrap();
        assert!(!cli().is_valid_repository(&repo).await);
    }

    #[tokio::test]
    async fn test_missing_binary_reports_git_error() {
        let dir = TempDir::new().unwrap();
        let repo = RepoPath::parse(dir.path().to_str().unwrap()).unwrap();
        let mut config = Config::default_config().git;
        config.binary = "definitely-not-a-git-binary".to_string();

        let err = GitCli::new(config).list_changes(&repo).await.unwrap_err();
        assert!(matches!(err, PipelineError::Git { ref command, .. } if command == "status"));
    }

    #[tokio::test]
    async fn test_list_changes_reports_kinds_and_line_counts() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("kept.txt", "one\n"), ("gone.txt", "bye\n")]);

        fs::write(dir.path().join("kept.txt"), "one\ntwo\n").unwrap();
        fs::remove_file(dir.path().join("gone.txt")).unwrap();
        fs::write(dir.path().join("fresh.txt"), "new\n").unwrap();

        let mut changes = cli().list_changes(&repo).await.unwrap();
        changes.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(
            changes,
            vec![
                FileChange::new("fresh.txt", ChangeKind::Added),
                FileChange::new("gone.txt", ChangeKind::Deleted).with_line_counts(0, 1),
                FileChange::new("kept.txt", ChangeKind::Modified).with_line_counts(1, 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_untracked_file_diff_is_whole_file() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("base.txt", "base\n")]);
        fs::write(dir.path().join("fresh.txt"), "hello\n").unwrap();

        let diff = cli().diff(&repo, Some("fresh.txt"), false).await.unwrap();
        assert!(diff.contains("/dev/null"));
        assert!(diff.contains("+hello"));

        let change = cli().change_diff(&repo, "fresh.txt").await.unwrap();
        assert!(change.contains("+hello"));
    }

    #[tokio::test]
    async fn test_partially_staged_file_is_committed_whole() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("notes.txt", "base\n")]);

        fs::write(dir.path().join("notes.txt"), "base\nSTAGED\n").unwrap();
        git(dir.path(), &["add", "notes.txt"]);
        fs::write(dir.path().join("notes.txt"), "base\nSTAGED\nUNSTAGED\n").unwrap();

        let working_tree = cli().diff(&repo, Some("notes.txt"), false).await.unwrap();
        assert!(!working_tree.contains("+STAGED"));

        let diff = cli().change_diff(&repo, "notes.txt").await.unwrap();
        assert!(diff.contains("+STAGED"));
        assert!(diff.contains("+UNSTAGED"));

        let vcs = cli();
        vcs.stage(&repo, "notes.txt").await.unwrap();
        vcs.commit(&repo, "Add notes", &["notes.txt".to_string()])
            .await
            .unwrap();

        let shown = git(dir.path(), &["show", "HEAD"]);
        assert!(shown.contains("+STAGED"));
        assert!(shown.contains("+UNSTAGED"));
        assert!(vcs.list_changes(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_commit_on_unborn_branch() {
        let (dir, repo) = init_repo();
        fs::write(dir.path().join("first.txt"), "hello\n").unwrap();
        let vcs = cli();

        let changes = vcs.list_changes(&repo).await.unwrap();
        assert_eq!(changes, vec![FileChange::new("first.txt", ChangeKind::Added)]);

        let diff = vcs.change_diff(&repo, "first.txt").await.unwrap();
        assert!(diff.contains("+hello"));

        vcs.stage(&repo, "first.txt").await.unwrap();
        let hash = vcs
            .commit(&repo, "Add first file", &["first.txt".to_string()])
            .await
            .unwrap();

        assert!(COMMIT_HASH.is_match(&hash));
        assert_eq!(git(dir.path(), &["rev-parse", "HEAD"]).trim(), hash);
        assert!(vcs.list_changes(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_commit_drops_old_path() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("old.txt", "content\n")]);
        git(dir.path(), &["mv", "old.txt", "new.txt"]);
        let vcs = cli();

        let changes = vcs.list_changes(&repo).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Renamed);
        assert_eq!(changes[0].path, "new.txt");
        assert_eq!(changes[0].old_path.as_deref(), Some("old.txt"));

        vcs.stage(&repo, "new.txt").await.unwrap();
        vcs.commit(
            &repo,
            "Rename old.txt",
            &["new.txt".to_string(), "old.txt".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(git(dir.path(), &["ls-tree", "--name-only", "HEAD"]), "new.txt\n");
        assert!(vcs.list_changes(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_file_is_staged_and_committed() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("keep.txt", "keep\n"), ("drop.txt", "drop\n")]);
        fs::remove_file(dir.path().join("drop.txt")).unwrap();
        let vcs = cli();

        vcs.stage(&repo, "drop.txt").await.unwrap();
        assert_eq!(vcs.staged_paths(&repo).await.unwrap(), vec!["drop.txt".to_string()]);

        vcs.commit(&repo, "Remove drop.txt", &["drop.txt".to_string()])
            .await
            .unwrap();

        assert_eq!(git(dir.path(), &["ls-tree", "--name-only", "HEAD"]), "keep.txt\n");
        assert!(vcs.list_changes(&repo).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unstage_clears_index_entries() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("base.txt", "base\n")]);
        fs::write(dir.path().join("base.txt"), "base\nmore\n").unwrap();
        fs::write(dir.path().join("fresh.txt"), "fresh\n").unwrap();
        let vcs = cli();

        vcs.stage(&repo, "base.txt").await.unwrap();
        vcs.stage(&repo, "fresh.txt").await.unwrap();
        assert_eq!(vcs.staged_paths(&repo).await.unwrap().len(), 2);

        vcs.unstage(&repo, &["base.txt".to_string(), "fresh.txt".to_string()])
            .await
            .unwrap();

        assert!(vcs.staged_paths(&repo).await.unwrap().is_empty());
        assert_eq!(git(dir.path(), &["diff", "--cached", "--name-only"]), "");
        assert!(dir.path().join("fresh.txt").exists());
    }

    #[tokio::test]
    async fn test_commit_leaves_unrelated_staging_alone() {
        let (dir, repo) = init_repo();
        commit_files(dir.path(), &[("a.txt", "a\n"), ("b.txt", "b\n")]);
        fs::write(dir.path().join("a.txt"), "a\nchanged\n").unwrap();
        fs::write(dir.path().join("b.txt"), "b\nchanged\n").unwrap();
        git(dir.path(), &["add", "b.txt"]);
        let vcs = cli();

        vcs.stage(&repo, "a.txt").await.unwrap();
        vcs.commit(&repo, "Change a.txt", &["a.txt".to_string()])
            .await
            .unwrap();

        let committed = git(dir.path(), &["show", "--name-only", "--format=", "HEAD"]);
        assert_eq!(committed.trim(), "a.txt");
        assert_eq!(vcs.staged_paths(&repo).await.unwrap(), vec!["b.txt".to_string()]);
    }
}
