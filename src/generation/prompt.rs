// file: src/generation/prompt.rs
// description: prompt construction and cleanup of generated commit messages
// reference: internal prompt templates

use crate::models::ChangeKind;

pub const SYSTEM_PROMPT: &str = "You write git commit messages. \
Reply with a single imperative summary line describing the change, \
no longer than 72 characters, without quotes, prefixes or explanations.";

pub fn build_user_prompt(file_path: &str, diff: &str, kind: ChangeKind, max_diff_chars: usize) -> String {
    let instruction = match kind {
        ChangeKind::Added => "A new file was added. Summarize what it introduces.",
        ChangeKind::Modified => "An existing file was modified. Summarize what changed.",
        ChangeKind::Deleted => "A file was deleted. Summarize what was removed.",
        ChangeKind::Renamed => "A file was renamed or moved. Mention the move and any edits.",
        ChangeKind::Copied => "A file was copied. Summarize why the copy exists if the diff shows it.",
    };

    let (diff, clipped) = clip(diff, max_diff_chars);
    let diff_block = if diff.trim().is_empty() {
        "(no textual diff available)".to_string()
    } else if clipped {
        format!("{}\n[diff truncated]", diff)
    } else {
        diff.to_string()
    };

    format!(
        "{}\n\nFile: {}\nChange: {}\n\nDiff:\n{}",
        instruction, file_path, kind, diff_block
    )
}

/// Strips code fences, wrapping quotes and surrounding blank lines the model
/// tends to add. Only the first non-empty line survives.
pub fn clean_message(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("```"))
        .unwrap_or_default();

    line.trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

fn clip(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
