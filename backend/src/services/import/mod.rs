//! Read-only view of the import job history.
//!
//! The provided routes are:
//! - `GET /api/import/status/{run_token}`: the `JobRecord` of one run, with its current
//!   `JobStatus` (`Pending`, `ImportingCategories`, `ImportingProducts`, `Completed` or
//!   `Failed`).
//! - `GET /api/import/runs`: every recorded run, oldest first.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod get_status;
mod list_runs;

const API_PATH: &str = "/api/import";

/// Configures and returns the Actix scope for the import job routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/status/{run_token}", get().to(get_status::process))
        .route("/runs", get().to(list_runs::process))
}
