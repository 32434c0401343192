use serde::Serialize;
use std::fmt;

/// Lifecycle of one run of the catalog import job.
///
/// ```text
/// Pending -> ImportingCategories -> ImportingProducts -> Completed
///                   |                       |
///                   +------> Failed <-------+
/// ```
///
/// `Completed` and `Failed` are terminal. `Completed` carries a one-line summary of
/// the run, `Failed` the cause that aborted it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum JobStatus {
    Pending,
    ImportingCategories,
    ImportingProducts,
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }

    /// Whether the job may move from `self` to `next`.
    pub fn can_transition_to(&self, next: &JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, ImportingCategories)
                | (Pending, Failed(_))
                | (ImportingCategories, ImportingProducts)
                | (ImportingCategories, Failed(_))
                | (ImportingProducts, Completed(_))
                | (ImportingProducts, Failed(_))
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::ImportingCategories => "IMPORTING_CATEGORIES",
            JobStatus::ImportingProducts => "IMPORTING_PRODUCTS",
            JobStatus::Completed(_) => "COMPLETED",
            JobStatus::Failed(_) => "FAILED",
        };
        f.write_str(label)
    }
}

/// Entry of the job history: one per launched run token.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_name: String,
    pub run_token: i64,
    /// Unique id of this execution (uuid v4).
    pub execution_id: String,
    pub status: JobStatus,
}
