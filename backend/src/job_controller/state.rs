//! Job history of the catalog import.
//!
//! Every launch of the import job is recorded here under its run token, the
//! millisecond timestamp supplied by the runner. The record tracks the job status
//! while the import runs on a blocking worker thread and keeps the terminal status
//! afterwards, so the status API can report it.
//!
//! The main components are:
//! - `JobsState`: a clonable, thread-safe handle on the history. It is injected into
//!   the Actix application state in `main.rs`.
//! - `JobUpdate`: a status change pushed by the import worker.
//! - `start_job_updater`: a long-running task that applies `JobUpdate`s to the history.

use crate::error::ImportError;
use common::jobs::{JobRecord, JobStatus};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for the job history.
#[derive(Clone)]
pub struct JobsState {
    /// Run token to job record.
    ///
    /// Read concurrently by the status endpoints, written by `start_job_updater`
    /// and by the runner when a run is registered or finished.
    pub jobs: Arc<RwLock<HashMap<i64, JobRecord>>>,

    /// Sender side of the update channel.
    ///
    /// The import worker cannot await, so it pushes `JobUpdate`s here with
    /// `blocking_send` instead of taking the `jobs` lock itself.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// A status update for one run.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) run_token: i64,
    pub(crate) status: JobStatus,
}

impl JobsState {
    pub fn new(tx: mpsc::Sender<JobUpdate>) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        }
    }

    /// Records a new execution of `job_name` for `run_token` and returns its
    /// execution id.
    ///
    /// A token whose run completed, or is still running, cannot be launched again.
    /// A failed run may be relaunched with the same token.
    pub async fn register(&self, job_name: &str, run_token: i64) -> Result<String, ImportError> {
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(&run_token) {
            match existing.status {
                JobStatus::Failed(_) => {}
                JobStatus::Completed(_) => {
                    return Err(ImportError::AlreadyComplete {
                        job_name: job_name.to_string(),
                        run_token,
                    })
                }
                _ => {
                    return Err(ImportError::AlreadyRunning {
                        job_name: job_name.to_string(),
                        run_token,
                    })
                }
            }
        }

        let execution_id = uuid::Uuid::new_v4().to_string();
        jobs.insert(
            run_token,
            JobRecord {
                job_name: job_name.to_string(),
                run_token,
                execution_id: execution_id.clone(),
                status: JobStatus::Pending,
            },
        );
        Ok(execution_id)
    }

    /// Stores the terminal status of a run, regardless of pending updates.
    pub async fn finish(&self, run_token: i64, status: JobStatus) {
        if let Some(record) = self.jobs.write().await.get_mut(&run_token) {
            record.status = status;
        }
    }

    pub async fn get(&self, run_token: i64) -> Option<JobRecord> {
        self.jobs.read().await.get(&run_token).cloned()
    }

    /// All recorded runs, oldest first.
    pub async fn list(&self) -> Vec<JobRecord> {
        let mut runs: Vec<JobRecord> = self.jobs.read().await.values().cloned().collect();
        runs.sort_by_key(|r| r.run_token);
        runs
    }
}

/// Starts the central job state updater task.
///
/// Spawned once from `main.rs`. Each `JobUpdate` received on `rx` is applied to
/// the history, unless the run already reached a terminal status: the runner
/// writes that one directly and a late update must not overwrite it.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if let Some(record) = jobs.get_mut(&update.run_token) {
            if !record.status.is_terminal() {
                record.status = update.status;
            }
        }
    }
}
