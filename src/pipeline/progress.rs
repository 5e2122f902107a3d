// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for pipeline execution
// reference: uses indicatif for progress bars and tracks processing metrics

use crate::models::{ProcessedFile, ProcessingError};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub commits_created: usize,
    pub duration_ms: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.files_processed + self.files_failed) as f64 * 1000.0 / self.duration_ms as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.files_processed + self.files_failed;
        if total == 0 {
            return 0.0;
        }
        (self.files_processed as f64 / total as f64) * 100.0
    }
}

/// Counts unit outcomes for one run. Drawing is disabled in server mode, where
/// the terminal belongs to the protocol peer.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    files_processed: AtomicUsize,
    files_failed: AtomicUsize,
    commits_created: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_files: usize, visible: bool) -> Self {
        let multi_progress = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        Self {
            main_bar: create_progress_bar(&multi_progress, total_files as u64),
            files_processed: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            commits_created: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_processed(&self, file: &ProcessedFile) {
        self.files_processed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.set_message(file.path.clone());
        self.main_bar.inc(1);
    }

    pub fn record_failed(&self, error: &ProcessingError) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.set_message(format!("{} failed", error.path));
        self.main_bar.inc(1);
    }

    pub fn add_commits(&self, count: usize) {
        self.commits_created.fetch_add(count, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Processing complete");
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            files_processed: self.files_processed.load(Ordering::SeqCst),
            files_failed: self.files_failed.load(Ordering::SeqCst),
            commits_created: self.commits_created.load(Ordering::SeqCst),
            duration_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░");
    bar.set_style(style);
    bar
}
