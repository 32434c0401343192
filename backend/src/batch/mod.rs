//! Startup import of the catalog from flat files.
//!
//! The pipeline, leaf first:
//! - `reader`: decodes CSV lines into `CategoryRecord` / `ProductRecord`.
//! - `mapper`: turns records into entities, resolving a product's category.
//! - `step`: drives read, map and write in chunks of ten.
//! - `job`: runs the category step, then the product step.
//! - `runner`: launches the job once per process and records it in the job history.

pub mod job;
pub mod mapper;
pub mod reader;
pub mod runner;
pub mod step;
