//! Types shared between the Shopverse backend and its clients.
//!
//! - `model`: flat CSV records and the persistent catalog entities.
//! - `jobs`: the lifecycle of the catalog import job as exposed by the status API.

pub mod jobs;
pub mod model;
