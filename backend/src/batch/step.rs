//! Chunk-oriented import step: read, map, write in fixed-size batches.
//!
//! Items are pulled from the reader one at a time and mapped immediately. Every
//! `chunk_size` items read, the chunk is filtered down to the successfully mapped
//! entities and handed to the writer in one call, so memory and round-trips stay
//! bounded. A trailing partial chunk is written as-is; a chunk with nothing left to
//! write does not reach the writer at all.
//!
//! What happens to a failed item is decided by [`FaultPolicy`]. Skipped items are
//! reported to a [`SkipListener`]. A lost input stream always aborts the step.

use crate::batch::mapper::ItemMapper;
use crate::error::{DecodeError, ImportError};
use log::{debug, error, info, warn};
use std::fmt::Debug;

/// Number of records read per chunk.
pub const CHUNK_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Log the failed item with its cause, drop it and keep going.
    SkipAndLog,
    /// Abort the step on the first failed item.
    FailFast,
}

/// Persists one chunk of entities. Any closure over a slice qualifies, so a
/// repository's `save_all` plugs in directly.
pub trait ItemWriter<T> {
    fn write(&mut self, chunk: &[T]) -> Result<(), ImportError>;
}

impl<T, F> ItemWriter<T> for F
where
    F: FnMut(&[T]) -> Result<(), ImportError>,
{
    fn write(&mut self, chunk: &[T]) -> Result<(), ImportError> {
        self(chunk)
    }
}

/// Told about every item a `SkipAndLog` step leaves out, with the raw item and
/// the cause.
pub trait SkipListener {
    fn on_skip(&mut self, step: &'static str, item: &str, cause: &ImportError);
}

impl<F> SkipListener for F
where
    F: FnMut(&'static str, &str, &ImportError),
{
    fn on_skip(&mut self, step: &'static str, item: &str, cause: &ImportError) {
        self(step, item, cause)
    }
}

/// Default listener: one warning line per skipped item.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSkips;

impl SkipListener for LogSkips {
    fn on_skip(&mut self, step: &'static str, item: &str, cause: &ImportError) {
        warn!("Error processing {} record: {}, cause: {}", step, item, cause);
    }
}

/// Result of reading and mapping one item.
#[derive(Debug)]
pub enum ItemOutcome<T> {
    Mapped(T),
    Skipped { item: String, cause: ImportError },
}

/// Counters reported once a step has run to the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSummary {
    pub step: &'static str,
    pub read: usize,
    pub written: usize,
    pub skipped: usize,
    pub chunks: usize,
}

pub struct ChunkedStep<M, W, L = LogSkips> {
    name: &'static str,
    chunk_size: usize,
    policy: FaultPolicy,
    mapper: M,
    writer: W,
    listener: L,
}

impl<M, W> ChunkedStep<M, W> {
    pub fn new(name: &'static str, policy: FaultPolicy, mapper: M, writer: W) -> Self {
        Self {
            name,
            chunk_size: CHUNK_SIZE,
            policy,
            mapper,
            writer,
            listener: LogSkips,
        }
    }
}

impl<M, W, L: SkipListener> ChunkedStep<M, W, L> {
    #[cfg(test)]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[cfg(test)]
    pub fn with_skip_listener<S: SkipListener>(self, listener: S) -> ChunkedStep<M, W, S> {
        ChunkedStep {
            name: self.name,
            chunk_size: self.chunk_size,
            policy: self.policy,
            mapper: self.mapper,
            writer: self.writer,
            listener,
        }
    }

    /// Drains `reader` through the mapper and writer.
    ///
    /// Returns the step counters, or the first error that aborted the step. Chunks
    /// written before the failure stay written.
    pub fn execute<I, R>(mut self, reader: R) -> Result<StepSummary, ImportError>
    where
        I: Debug,
        M: ItemMapper<I>,
        W: ItemWriter<<M as ItemMapper<I>>::Output>,
        R: IntoIterator<Item = Result<I, DecodeError>>,
    {
        let mut summary = StepSummary {
            step: self.name,
            ..Default::default()
        };
        let mut chunk: Vec<ItemOutcome<<M as ItemMapper<I>>::Output>> =
            Vec::with_capacity(self.chunk_size);

        for item in reader {
            summary.read += 1;
            let item = match item {
                Err(e) if e.is_fatal() => {
                    error!("Step {} lost its input: {}", self.name, e);
                    return Err(ImportError::StepAborted {
                        step: self.name,
                        source: Box::new(ImportError::Decode(e)),
                    });
                }
                item => item,
            };
            let outcome = match self.process(item) {
                ItemOutcome::Skipped { item, cause } if self.policy == FaultPolicy::FailFast => {
                    error!("Error processing {} record: {}, cause: {}", self.name, item, cause);
                    return Err(ImportError::StepAborted {
                        step: self.name,
                        source: Box::new(cause),
                    });
                }
                outcome => outcome,
            };
            chunk.push(outcome);

            if chunk.len() == self.chunk_size {
                self.write_chunk(&mut chunk, &mut summary)?;
            }
        }

        if !chunk.is_empty() {
            self.write_chunk(&mut chunk, &mut summary)?;
        }

        info!(
            "Step {} finished: read={} written={} skipped={} chunks={}",
            summary.step, summary.read, summary.written, summary.skipped, summary.chunks
        );
        Ok(summary)
    }

    fn process<I>(&self, item: Result<I, DecodeError>) -> ItemOutcome<<M as ItemMapper<I>>::Output>
    where
        I: Debug,
        M: ItemMapper<I>,
    {
        match item {
            Ok(record) => match self.mapper.map(&record) {
                Ok(entity) => ItemOutcome::Mapped(entity),
                Err(cause) => ItemOutcome::Skipped {
                    item: format!("{record:?}"),
                    cause,
                },
            },
            Err(e) => ItemOutcome::Skipped {
                item: e
                    .raw_line()
                    .map_or_else(|| "<unreadable line>".to_string(), str::to_string),
                cause: ImportError::Decode(e),
            },
        }
    }

    fn write_chunk<T>(
        &mut self,
        chunk: &mut Vec<ItemOutcome<T>>,
        summary: &mut StepSummary,
    ) -> Result<(), ImportError>
    where
        W: ItemWriter<T>,
    {
        let mut entities = Vec::with_capacity(chunk.len());
        for outcome in chunk.drain(..) {
            match outcome {
                ItemOutcome::Mapped(entity) => entities.push(entity),
                ItemOutcome::Skipped { item, cause } => {
                    self.listener.on_skip(self.name, &item, &cause);
                    summary.skipped += 1;
                }
            }
        }

        if entities.is_empty() {
            return Ok(());
        }

        self.writer.write(&entities)?;
        summary.written += entities.len();
        summary.chunks += 1;
        debug!(
            "Step {}: wrote chunk #{} ({} items)",
            self.name,
            summary.chunks,
            entities.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Maps a number to itself, failing for the configured ones.
    struct FailOn(HashSet<i64>);

    impl ItemMapper<i64> for FailOn {
        type Output = i64;

        fn map(&self, item: &i64) -> Result<i64, ImportError> {
            if self.0.contains(item) {
                Err(ImportError::CategoryNotFound(*item))
            } else {
                Ok(*item)
            }
        }
    }

    fn mapper(failing: &[i64]) -> FailOn {
        FailOn(failing.iter().copied().collect())
    }

    fn valid(range: std::ops::RangeInclusive<i64>) -> Vec<Result<i64, DecodeError>> {
        range.map(Ok).collect()
    }

    fn malformed(line: u64) -> Result<i64, DecodeError> {
        Err(DecodeError::Field {
            line,
            message: "invalid digit found in string".into(),
            raw: "x,Broken,line".into(),
        })
    }

    #[test]
    fn twenty_five_items_make_three_writes() {
        let mut writes: Vec<Vec<i64>> = Vec::new();
        let summary = ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[]),
            |chunk: &[i64]| -> Result<(), ImportError> {
                writes.push(chunk.to_vec());
                Ok(())
            },
        )
        .execute(valid(1..=25))
        .unwrap();

        let sizes: Vec<usize> = writes.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(writes.concat(), (1..=25).collect::<Vec<_>>());
        assert_eq!(
            summary,
            StepSummary {
                step: "categories",
                read: 25,
                written: 25,
                skipped: 0,
                chunks: 3,
            }
        );
    }

    #[test]
    fn skip_policy_drops_failed_items_and_keeps_going() {
        let mut items = valid(1..=4);
        items.push(malformed(6));
        items.extend(valid(5..=12));

        let mut writes: Vec<Vec<i64>> = Vec::new();
        let summary = ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[3, 11]),
            |chunk: &[i64]| -> Result<(), ImportError> {
                writes.push(chunk.to_vec());
                Ok(())
            },
        )
        .execute(items)
        .unwrap();

        // chunks are cut on items read, then filtered
        assert_eq!(writes, vec![vec![1, 2, 4, 5, 6, 7, 8, 9], vec![10, 12]]);
        assert_eq!(summary.read, 13);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.written, 10);
        assert_eq!(summary.chunks, 2);
    }

    #[test]
    fn skipped_items_reach_the_listener_with_line_and_cause() {
        let mut heard: Vec<(&'static str, String, String)> = Vec::new();
        ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[2]),
            |_: &[i64]| -> Result<(), ImportError> { Ok(()) },
        )
        .with_skip_listener(|step: &'static str, item: &str, cause: &ImportError| {
            heard.push((step, item.to_string(), cause.to_string()));
        })
        .execute(vec![Ok(1), Ok(2), malformed(4)])
        .unwrap();

        assert_eq!(heard.len(), 2);
        assert_eq!(heard[0].0, "categories");
        assert_eq!(heard[0].1, "2");
        assert_eq!(heard[0].2, "referenced category not found: 2");
        assert_eq!(heard[1].1, "x,Broken,line");
        assert!(heard[1].2.contains("line 4"));
    }

    #[test]
    fn lost_input_aborts_even_when_skipping() {
        let mut writes = 0;
        let broken = csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "stream reset",
        ));
        let err = ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[]),
            |_: &[i64]| -> Result<(), ImportError> {
                writes += 1;
                Ok(())
            },
        )
        .execute(vec![Ok(1), Ok(2), Err(DecodeError::Read(broken)), Ok(3)])
        .unwrap_err();

        assert_eq!(writes, 0);
        match err {
            ImportError::StepAborted { step, source } => {
                assert_eq!(step, "categories");
                assert!(matches!(*source, ImportError::Decode(DecodeError::Read(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn chunk_with_only_failures_is_not_written() {
        let mut calls = 0;
        let summary = ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[1, 2]),
            |_: &[i64]| -> Result<(), ImportError> {
                calls += 1;
                Ok(())
            },
        )
        .with_chunk_size(2)
        .execute(valid(1..=2))
        .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.chunks, 0);
    }

    #[test]
    fn fail_fast_aborts_and_leaves_earlier_chunks_written() {
        let mut writes: Vec<Vec<i64>> = Vec::new();
        let err = ChunkedStep::new(
            "products",
            FaultPolicy::FailFast,
            mapper(&[13]),
            |chunk: &[i64]| -> Result<(), ImportError> {
                writes.push(chunk.to_vec());
                Ok(())
            },
        )
        .execute(valid(1..=25))
        .unwrap_err();

        assert_eq!(writes, vec![(1..=10).collect::<Vec<_>>()]);
        match err {
            ImportError::StepAborted { step, source } => {
                assert_eq!(step, "products");
                assert!(matches!(*source, ImportError::CategoryNotFound(13)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fail_fast_aborts_on_decode_error() {
        let mut writes = 0;
        let err = ChunkedStep::new(
            "products",
            FaultPolicy::FailFast,
            mapper(&[]),
            |_: &[i64]| -> Result<(), ImportError> {
                writes += 1;
                Ok(())
            },
        )
        .execute(vec![Ok(1), malformed(3), Ok(2)])
        .unwrap_err();

        assert_eq!(writes, 0);
        assert!(matches!(
            err,
            ImportError::StepAborted { source, .. } if matches!(*source, ImportError::Decode(_))
        ));
    }

    #[test]
    fn writer_failure_is_not_isolated() {
        let err = ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[]),
            |_: &[i64]| -> Result<(), ImportError> {
                Err(ImportError::Worker("disk full".into()))
            },
        )
        .execute(valid(1..=3))
        .unwrap_err();

        assert!(matches!(err, ImportError::Worker(_)));
    }

    #[test]
    fn empty_input_writes_nothing() {
        let mut calls = 0;
        let summary = ChunkedStep::new(
            "categories",
            FaultPolicy::SkipAndLog,
            mapper(&[]),
            |_: &[i64]| -> Result<(), ImportError> {
                calls += 1;
                Ok(())
            },
        )
        .execute(Vec::new())
        .unwrap();

        assert_eq!(calls, 0);
        assert_eq!(summary.read, 0);
    }
}
