// file: src/pipeline/gate.rs
// description: permit pool bounding concurrent units and per-repository write locks
// reference: https://docs.rs/tokio/latest/tokio/sync/struct.Semaphore.html

use crate::error::{PipelineError, Result};
use crate::models::RepoPath;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, Semaphore};

/// Counting permit pool. A unit holds one permit for its whole run and gives
/// it back when it finishes, whatever the outcome.
pub struct ConcurrencyGate {
    permits: Semaphore,
    size: usize,
}

impl ConcurrencyGate {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Semaphore::new(size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Waits for a permit, then drives `unit` to completion while holding it.
    /// A unit never runs without a permit: a closed gate is an error.
    pub async fn run<F>(&self, unit: F) -> Result<F::Output>
    where
        F: Future,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PipelineError::Concurrency(e.to_string()))?;

        Ok(unit.await)
    }

    #[cfg(test)]
    fn close(&self) {
        self.permits.close();
    }
}

/// Hands out one async mutex per repository so that stage and commit never
/// interleave on the same index.
#[derive(Default)]
pub struct RepositoryLocks {
    locks: StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl RepositoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_repo(&self, repo: &RepoPath) -> Arc<Mutex<()>> {
        let key = repo
            .as_path()
            .canonicalize()
            .unwrap_or_else(|_| repo.as_path().to_path_buf());

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key).or_default().clone()
    }
}
