use crate::batch::job::{ImportJob, ImportSources, JobExecution};
use crate::error::{ImportError, RepositoryError};
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::repository::sqlite::{self, SqliteCategoryRepository, SqliteProductRepository};
use crate::repository::{CategoryRepository, ProductRepository};
use common::jobs::JobStatus;
use log::{debug, error, info, log_enabled, warn, Level};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

pub const JOB_NAME: &str = "import_catalog_job";

/// Launches the catalog import and reports how it ended.
pub struct JobRunner {
    jobs: JobsState,
    db_path: PathBuf,
    sources: ImportSources,
}

impl JobRunner {
    pub fn new(jobs: JobsState, db_path: impl Into<PathBuf>, sources: ImportSources) -> Self {
        Self {
            jobs,
            db_path: db_path.into(),
            sources,
        }
    }

    /// Runs the job once, using the current time in milliseconds as run token.
    /// Never retries.
    pub async fn run_once(&self) -> JobStatus {
        let run_token = chrono::Utc::now().timestamp_millis();
        match self.launch(run_token).await {
            Ok(status) => status,
            Err(e) => {
                error!("Could not launch {}: {}", JOB_NAME, e);
                JobStatus::Failed(e.to_string())
            }
        }
    }

    /// Registers the run in the job history, executes it on a blocking worker
    /// thread and records the terminal status.
    ///
    /// Fails only if the history refuses the run token; a failed import is an
    /// `Ok(JobStatus::Failed(_))`.
    pub async fn launch(&self, run_token: i64) -> Result<JobStatus, ImportError> {
        let execution_id = self.jobs.register(JOB_NAME, run_token).await?;
        info!(
            "Launching {} with run token {} (execution {})",
            JOB_NAME, run_token, execution_id
        );

        let tx = self.jobs.tx.clone();
        let db_path = self.db_path.clone();
        let sources = self.sources.clone();
        let handle = tokio::task::spawn_blocking(move || {
            import_blocking(&db_path, sources, run_token, tx)
        });

        let status = match handle.await {
            Ok(Ok(execution)) => execution.status,
            Ok(Err(e)) => {
                error!("{} failed: {}", JOB_NAME, e);
                JobStatus::Failed(e.to_string())
            }
            Err(join_err) => {
                let e = ImportError::Worker(join_err.to_string());
                error!("{} failed: {}", JOB_NAME, e);
                JobStatus::Failed(e.to_string())
            }
        };
        self.jobs.finish(run_token, status.clone()).await;

        info!("Job Status: {}", status);
        Ok(status)
    }
}

/// Opens the store and drives the job to its end. Runs on a blocking thread.
fn import_blocking(
    db_path: &Path,
    sources: ImportSources,
    run_token: i64,
    tx: mpsc::Sender<JobUpdate>,
) -> Result<JobExecution, ImportError> {
    let conn = sqlite::open(db_path)?;
    let categories = SqliteCategoryRepository::new(&conn);
    let products = SqliteProductRepository::new(&conn);

    let execution = ImportJob::new(sources, &categories, &products).run(|status| {
        let _ = tx.blocking_send(JobUpdate {
            run_token,
            status: status.clone(),
        });
    });

    if let Some(cause) = &execution.failure {
        error!("{} failed: {}", JOB_NAME, cause);
    }
    let skipped: usize = execution.steps.iter().map(|s| s.skipped).sum();
    if skipped > 0 {
        warn!("{} skipped {} record(s)", JOB_NAME, skipped);
    }
    if let Err(e) = report_catalog(&categories, &products) {
        warn!("Could not summarize the catalog: {}", e);
    }
    Ok(execution)
}

/// Logs what the store holds once the run is over, whatever its outcome.
fn report_catalog<C, P>(categories: &C, products: &P) -> Result<(), RepositoryError>
where
    C: CategoryRepository + ?Sized,
    P: ProductRepository + ?Sized,
{
    info!(
        "Catalog holds {} categories and {} products",
        categories.count()?,
        products.count()?
    );
    if log_enabled!(Level::Debug) {
        for category in categories.find_all()? {
            let owned = products.find_by_category_id(category.id)?;
            debug!("Category {} ({}): {} products", category.id, category.name, owned.len());
        }
    }
    Ok(())
}
