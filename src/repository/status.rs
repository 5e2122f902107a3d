// file: src/repository/status.rs
// description: parsers for git status porcelain and diff numstat output
// reference: https://git-scm.com/docs/git-status#_porcelain_format_version_1

use crate::models::{ChangeKind, FileChange};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

lazy_static! {
    static ref NUMSTAT_ENTRY: Regex =
        Regex::new(r"^(\d+|-)\t(\d+|-)\t(.+)$").expect("NUMSTAT_ENTRY regex is valid");

    pub static ref COMMIT_HASH: Regex =
        Regex::new(r"^[0-9a-f]{7,64}$").expect("COMMIT_HASH regex is valid");
}

/// Parses `git status --porcelain=v1 -z` output.
///
/// Renames and copies are followed by an extra NUL-terminated field holding
/// the original path. Unmerged entries are skipped.
pub fn parse_porcelain(output: &str) -> Vec<FileChange> {
    let mut changes = Vec::new();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());

    while let Some(entry) = fields.next() {
        if entry.len() < 4 {
            debug!("Ignoring short status entry: {:?}", entry);
            continue;
        }

        let mut codes = entry.chars();
        let index = codes.next().unwrap_or(' ');
        let worktree = codes.next().unwrap_or(' ');
        let path = &entry[3..];

        if is_unmerged(index, worktree) {
            warn!("Skipping unmerged path: {}", path);
            continue;
        }

        let old_path = if matches!(index, 'R' | 'C') {
            fields.next()
        } else {
            None
        };

        let code = if index == ' ' { worktree } else { index };
        let Some(kind) = ChangeKind::from_status_code(code) else {
            debug!("Unknown status code {:?} for {}", code, path);
            continue;
        };

        let mut change = FileChange::new(path, kind);
        if let Some(old) = old_path {
            change = change.with_old_path(old);
        }
        changes.push(change);
    }

    changes
}

fn is_unmerged(index: char, worktree: char) -> bool {
    index == 'U' || worktree == 'U' || (index == 'A' && worktree == 'A') || (index == 'D' && worktree == 'D')
}

/// Parses `git diff --numstat -z --no-renames` output into per-path line counts.
/// Binary files report `-` and count as zero.
pub fn parse_numstat(output: &str) -> HashMap<String, (u32, u32)> {
    let mut counts = HashMap::new();

    for entry in output.split('\0').filter(|e| !e.trim().is_empty()) {
        let entry = entry.trim_start_matches('\n');
        let Some(caps) = NUMSTAT_ENTRY.captures(entry) else {
            debug!("Ignoring numstat entry: {:?}", entry);
            continue;
        };

        let added = caps[1].parse().unwrap_or(0);
        let deleted = caps[2].parse().unwrap_or(0);
        counts.insert(caps[3].to_string(), (added, deleted));
    }

    counts
}

/// Adds line counts from one or more numstat maps onto the listed changes.
pub fn apply_line_counts(changes: &mut [FileChange], numstats: &[HashMap<String, (u32, u32)>]) {
    for change in changes.iter_mut() {
        for stats in numstats {
            if let Some((added, deleted)) = stats.get(&change.path) {
                change.lines_added += added;
                change.lines_deleted += deleted;
            }
        }
    }
}
