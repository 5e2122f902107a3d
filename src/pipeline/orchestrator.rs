// file: src/pipeline/orchestrator.rs
// description: coordinates repository validation, change listing, bounded processing and aggregation
// reference: orchestrates asynchronous commit workflow

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::generation::MessageGenerator;
use crate::models::{ErrorStage, ProcessingError, ProcessingRequest, ProcessingResult};
use crate::pipeline::aggregate::{self, UnitOutcome};
use crate::pipeline::gate::{ConcurrencyGate, RepositoryLocks};
use crate::pipeline::processor::FileProcessor;
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::repository::VersionControl;
use crate::utils::OperationTimer;
use futures::future::join_all;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

pub const INVALID_REPOSITORY: &str = "invalid repository";

pub struct ChangePipeline<V, G> {
    vcs: V,
    generator: G,
    gate: ConcurrencyGate,
    locks: RepositoryLocks,
    max_message_length: usize,
    show_progress: bool,
}

impl<V, G> ChangePipeline<V, G>
where
    V: VersionControl,
    G: MessageGenerator,
{
    pub fn new(vcs: V, generator: G, config: &PipelineConfig) -> Self {
        Self {
            vcs,
            generator,
            gate: ConcurrencyGate::new(config.max_concurrent_files),
            locks: RepositoryLocks::new(),
            max_message_length: config.max_message_length,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Runs one request to completion. Failures are reported inside the
    /// result, never as an `Err`.
    pub async fn process(&self, request: &ProcessingRequest) -> ProcessingResult {
        let span = info_span!(
            "pipeline_run",
            run_id = %Uuid::new_v4(),
            repo = %request.repo_path,
            individual = request.commit_individually
        );

        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &ProcessingRequest) -> ProcessingResult {
        let repo = &request.repo_path;
        let timer = OperationTimer::new("commit changes");

        if !self.vcs.is_valid_repository(repo).await {
            warn!("Not a usable repository: {}", repo);
            return ProcessingResult::failed(ProcessingError::new(
                repo.to_string(),
                ErrorStage::Status,
                INVALID_REPOSITORY,
            ));
        }

        let changes = match self.vcs.list_changes(repo).await {
            Ok(changes) => changes,
            Err(e) => {
                warn!("Failed to list changes in {}: {}", repo, e);
                return ProcessingResult::failed(ProcessingError::new(
                    repo.to_string(),
                    ErrorStage::Status,
                    e.to_string(),
                ));
            }
        };

        if changes.is_empty() {
            info!("No uncommitted changes in {}", repo);
            return ProcessingResult::empty();
        }

        info!(
            "Processing {} changed file(s) with up to {} concurrent units",
            changes.len(),
            self.gate.size()
        );

        let progress = ProgressTracker::new(changes.len(), self.show_progress);
        let processor = FileProcessor::new(
            &self.vcs,
            &self.generator,
            self.locks.for_repo(repo),
            self.max_message_length,
        );

        let result = if request.commit_individually {
            let processor = &processor;
            let progress = &progress;

            let units = changes.iter().map(|change| async move {
                let outcome = self
                    .gate
                    .run(processor.process(repo, &request.model, change))
                    .await
                    .unwrap_or_else(|e| Err(unscheduled(&change.path, e)));
                record(progress, &outcome);
                outcome
            });

            aggregate::aggregate(join_all(units).await)
        } else {
            let outcome = self
                .gate
                .run(processor.process_batch(repo, &request.model, &changes))
                .await
                .unwrap_or_else(|e| Err(unscheduled(&repo.to_string(), e)));

            match &outcome {
                Ok(files) => files.iter().for_each(|f| progress.record_processed(f)),
                Err(e) => error!("Batch commit failed at {} stage: {}", e.stage, e.message),
            }

            aggregate::aggregate_batch(outcome)
        };

        progress.add_commits(result.total_commits);
        progress.finish();
        log_final_stats(&progress.get_stats());
        timer.finish_with_count(changes.len());

        result
    }
}

/// A unit the gate refused to run is reported like any other failed unit.
fn unscheduled(path: &str, error: PipelineError) -> ProcessingError {
    ProcessingError::new(path, ErrorStage::Status, error.to_string())
}

fn record(progress: &ProgressTracker, outcome: &UnitOutcome) {
    match outcome {
        Ok(file) => progress.record_processed(file),
        Err(error) => {
            warn!(
                "Failed to process {} at {} stage: {}",
                error.path, error.stage, error.message
            );
            progress.record_failed(error);
        }
    }
}

fn log_final_stats(stats: &PipelineStats) {
    info!("=== Pipeline Execution Summary ===");
    info!("Duration: {} ms", stats.duration_ms);
    info!("Files processed: {}", stats.files_processed);
    info!("Files failed: {}", stats.files_failed);
    info!("Commits created: {}", stats.commits_created);
    info!("Success rate: {:.2}%", stats.success_rate());
    info!("Processing speed: {:.2} files/sec", stats.files_per_second());
    info!("=================================");
}
