//! The catalog import job: categories first, then products.
//!
//! `ImportJob` is a small state machine driven once per run. It moves through
//! `ImportingCategories` and `ImportingProducts` and ends in `Completed`, or in
//! `Failed` as soon as either step reports an error. The product phase only starts
//! once the category step has returned, however many category lines it skipped.
//! Nothing written by the category phase is undone when the product phase fails.

use crate::batch::mapper::{CategoryLookup, CategoryMapper, ProductMapper};
use crate::batch::reader::CsvRecordReader;
use crate::batch::step::{ChunkedStep, FaultPolicy, StepSummary};
use crate::error::ImportError;
use crate::repository::{CategoryRepository, ProductRepository};
use common::jobs::JobStatus;
use common::model::category::Category;
use common::model::csv::{CategoryRecord, ProductRecord};
use common::model::product::Product;
use log::info;
use std::path::PathBuf;

pub const CATEGORY_STEP: &str = "import_categories";
pub const PRODUCT_STEP: &str = "import_products";

/// Message carried by `Completed`. Step counters stay in the step summaries.
pub const COMPLETED_MESSAGE: &str = "catalog imported";

/// Location of the two input files.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSources {
    pub categories: PathBuf,
    pub products: PathBuf,
}

/// Outcome of one run.
#[derive(Debug)]
pub struct JobExecution {
    pub status: JobStatus,
    /// Summaries of the steps that ran to the end, in order.
    pub steps: Vec<StepSummary>,
    /// The error that moved the job to `Failed`.
    pub failure: Option<ImportError>,
}

pub struct ImportJob<'a, C: ?Sized, P: ?Sized> {
    sources: ImportSources,
    categories: &'a C,
    products: &'a P,
    status: JobStatus,
}

impl<'a, C, P> ImportJob<'a, C, P>
where
    C: CategoryRepository + CategoryLookup + ?Sized,
    P: ProductRepository + ?Sized,
{
    pub fn new(sources: ImportSources, categories: &'a C, products: &'a P) -> Self {
        Self {
            sources,
            categories,
            products,
            status: JobStatus::Pending,
        }
    }

    /// Runs both phases to completion or failure. `on_transition` sees every
    /// status the job enters, terminal one included.
    pub fn run(mut self, mut on_transition: impl FnMut(&JobStatus)) -> JobExecution {
        let mut steps = Vec::with_capacity(2);

        self.advance(JobStatus::ImportingCategories, &mut on_transition);
        match self.import_categories() {
            Ok(summary) => steps.push(summary),
            Err(e) => return self.fail(e, steps, &mut on_transition),
        }

        self.advance(JobStatus::ImportingProducts, &mut on_transition);
        match self.import_products() {
            Ok(summary) => steps.push(summary),
            Err(e) => return self.fail(e, steps, &mut on_transition),
        }

        self.advance(
            JobStatus::Completed(COMPLETED_MESSAGE.to_string()),
            &mut on_transition,
        );

        JobExecution {
            status: self.status,
            steps,
            failure: None,
        }
    }

    fn advance(&mut self, next: JobStatus, on_transition: &mut impl FnMut(&JobStatus)) {
        debug_assert!(
            self.status.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.status,
            next
        );
        info!("Import job: {} -> {}", self.status, next);
        self.status = next;
        on_transition(&self.status);
    }

    fn fail(
        &mut self,
        cause: ImportError,
        steps: Vec<StepSummary>,
        on_transition: &mut impl FnMut(&JobStatus),
    ) -> JobExecution {
        self.advance(JobStatus::Failed(cause.to_string()), on_transition);
        JobExecution {
            status: self.status.clone(),
            steps,
            failure: Some(cause),
        }
    }

    fn import_categories(&self) -> Result<StepSummary, ImportError> {
        let reader = CsvRecordReader::<CategoryRecord>::open(
            &self.sources.categories,
            &CategoryRecord::COLUMNS,
        )?;

        // TODO: confirm with the catalog owners whether a bad category line should
        // abort the step like a bad product line does. Until then categories skip
        // and log, products fail fast.
        ChunkedStep::new(
            CATEGORY_STEP,
            FaultPolicy::SkipAndLog,
            CategoryMapper,
            |chunk: &[Category]| -> Result<(), ImportError> {
                self.categories.save_all(chunk)?;
                Ok(())
            },
        )
        .execute(reader)
    }

    fn import_products(&self) -> Result<StepSummary, ImportError> {
        let reader = CsvRecordReader::<ProductRecord>::open(
            &self.sources.products,
            &ProductRecord::COLUMNS,
        )?;

        ChunkedStep::new(
            PRODUCT_STEP,
            FaultPolicy::FailFast,
            ProductMapper::new(self.categories),
            |chunk: &[Product]| -> Result<(), ImportError> {
                self.products.save_all(chunk)?;
                Ok(())
            },
        )
        .execute(reader)
    }
}
