//! Import pipeline
//!
//! Ties the pieces together for one upload:
//!
//! 1. [`FormatValidator`] checks the declared media type; a mismatch fails
//!    before a single byte is read.
//! 2. [`RowParser`] streams the input against the schema, turning each data
//!    row into a record or a skipped-row entry.
//! 3. Valid records go to the [`PersistenceSink`] as one bulk call, or in
//!    batches of [`ImportConfig::batch_size`] while streaming.
//! 4. The returned records and skipped rows become the [`ImportReport`].
//!
//! Row failures never abort an import. Everything else does: a rejected
//! media type, a header that does not satisfy the schema, a failing reader,
//! or a failing sink.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use crate::parser::{RowError, RowParser};
use crate::record::Record;
use crate::report::ImportReport;
use crate::schema::{RecordSchema, SchemaError};
use crate::sink::{repeated_keys, ConflictPolicy, PersistenceSink, SinkError};
use crate::validator::FormatValidator;

/// Tuning knobs for one pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportConfig {
    /// Flush to the sink every `batch_size` records; `None` sends one bulk call
    pub batch_size: Option<NonZeroUsize>,
    /// Upper bound for each sink call
    pub sink_timeout: Option<Duration>,
}

impl ImportConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = NonZeroUsize::new(batch_size);
        self
    }

    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = Some(timeout);
        self
    }
}

/// A file handed to the pipeline together with its client-declared metadata
#[derive(Debug)]
pub struct Upload<R> {
    pub filename: Option<String>,
    pub media_type: Option<String>,
    pub reader: R,
}

impl<R: Read> Upload<R> {
    pub fn new(reader: R) -> Self {
        Self {
            filename: None,
            media_type: None,
            reader,
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Whole-import failures
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Declared media type '{declared}' is not accepted (expected '{expected}')")]
    Validation { declared: String, expected: String },

    #[error("Header does not match the record schema: {0}")]
    SchemaMismatch(#[from] SchemaError),

    #[error("Input could not be read at row {row_index}: {message}")]
    Read { row_index: usize, message: String },

    /// The sink refused a batch
    ///
    /// `attempted` holds the keys of the failed batch, `committed` the number
    /// of records persisted by earlier batches of the same import and
    /// `skipped` the row errors collected up to the failure.
    #[error("{source}")]
    Sink {
        #[source]
        source: SinkError,
        attempted: Vec<i64>,
        committed: usize,
        skipped: Vec<RowError>,
    },
}

impl ImportError {
    /// Whether the caller sent something the pipeline refuses to look at
    pub fn is_validation(&self) -> bool {
        matches!(self, ImportError::Validation { .. })
    }

    pub fn sink_error(&self) -> Option<&SinkError> {
        match self {
            ImportError::Sink { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Validator, parser, schema and sink wired together for one record kind
pub struct ImportPipeline<S: PersistenceSink + ?Sized> {
    validator: FormatValidator,
    parser: RowParser,
    schema: Arc<RecordSchema>,
    sink: Arc<S>,
    config: ImportConfig,
}

impl<S: PersistenceSink + ?Sized> Clone for ImportPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            validator: self.validator.clone(),
            parser: self.parser,
            schema: Arc::clone(&self.schema),
            sink: Arc::clone(&self.sink),
            config: self.config,
        }
    }
}

impl<S> ImportPipeline<S>
where
    S: PersistenceSink + ?Sized,
    S::Record: Record,
{
    pub fn new(
        validator: FormatValidator,
        parser: RowParser,
        schema: Arc<RecordSchema>,
        sink: Arc<S>,
    ) -> Self {
        Self {
            validator,
            parser,
            schema,
            sink,
            config: ImportConfig::default(),
        }
    }

    /// Pipeline with the default validator and parser and the record kind's own schema
    pub fn for_record(sink: Arc<S>) -> Self {
        Self::new(
            FormatValidator::default(),
            RowParser::default(),
            Arc::new(<S::Record as Record>::schema().clone()),
            sink,
        )
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Run one upload through the pipeline
    #[tracing::instrument(skip(self, upload), fields(import_id = %Uuid::new_v4()))]
    pub async fn import<R>(&self, upload: Upload<R>) -> Result<ImportReport<S::Record>, ImportError>
    where
        R: Read + Send,
    {
        let started = Instant::now();
        let declared = upload.media_type.unwrap_or_default();

        tracing::info!(
            filename = upload.filename.as_deref().unwrap_or(""),
            media_type = %declared,
            "Import started"
        );

        if !self.validator.accepts(&declared) {
            tracing::warn!(
                declared = %declared,
                expected = %self.validator.expected(),
                "Upload rejected by media type"
            );
            return Err(ImportError::Validation {
                declared,
                expected: self.validator.expected().to_string(),
            });
        }

        let rows = self
            .parser
            .parse::<R, S::Record>(upload.reader, &self.schema)
            .inspect_err(|e| tracing::warn!(error = %e, "Header rejected"))?;

        let mut report = ImportReport::new();
        let mut skipped: Vec<RowError> = Vec::new();
        let mut pending: Vec<(usize, S::Record)> = Vec::new();
        let mut flushed: HashMap<i64, Vec<usize>> = HashMap::new();

        for (position, row) in rows.enumerate() {
            match row {
                Ok(record) => pending.push((position + 1, record)),
                Err(err) if err.is_fatal() => {
                    tracing::error!(row_index = err.row_index, error = %err.kind, "Input stream failed");
                    return Err(ImportError::Read {
                        row_index: err.row_index,
                        message: err.reason(),
                    });
                },
                Err(err) => {
                    tracing::debug!(row_index = err.row_index, reason = %err.kind, "Row skipped");
                    report.push_skipped(err.row_index, err.reason());
                    skipped.push(err);
                },
            }

            if self
                .config
                .batch_size
                .is_some_and(|size| pending.len() >= size.get())
            {
                self.flush(&mut pending, &mut report, &mut flushed, &skipped)
                    .await?;
            }
        }

        if !pending.is_empty() {
            self.flush(&mut pending, &mut report, &mut flushed, &skipped)
                .await?;
        }

        let report = report.finish();
        tracing::info!(
            imported = report.imported_count(),
            skipped = report.skipped_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Import finished"
        );

        Ok(report)
    }

    /// Send the pending records to the sink and record their outcomes
    ///
    /// `flushed` maps every key sent by earlier batches of this import to
    /// the rows that carried it, the stored one last. A key that shows up
    /// again is a repeat within the file: under replace all earlier rows are
    /// marked superseded by the new one, under reject the batch fails before
    /// reaching the sink.
    async fn flush(
        &self,
        pending: &mut Vec<(usize, S::Record)>,
        report: &mut ImportReport<S::Record>,
        flushed: &mut HashMap<i64, Vec<usize>>,
        skipped: &[RowError],
    ) -> Result<(), ImportError> {
        let (row_indexes, records): (Vec<usize>, Vec<S::Record>) =
            std::mem::take(pending).into_iter().unzip();
        let keys: Vec<i64> = records.iter().map(Record::key).collect();
        let committed = report.imported_count();

        if self.sink.conflict_policy() == ConflictPolicy::Reject {
            let mut colliding: BTreeSet<i64> =
                keys.iter().copied().filter(|key| flushed.contains_key(key)).collect();
            if !colliding.is_empty() {
                colliding.extend(repeated_keys(&records));
                tracing::warn!(
                    colliding = colliding.len(),
                    committed,
                    "Batch repeats keys from earlier rows of the file"
                );
                return Err(ImportError::Sink {
                    source: SinkError::DuplicateKeys {
                        keys: colliding.into_iter().collect(),
                    },
                    attempted: keys,
                    committed,
                    skipped: skipped.to_vec(),
                });
            }
        }

        // Last row carrying each key; earlier rows with that key are superseded.
        let mut latest: HashMap<i64, usize> = HashMap::with_capacity(keys.len());
        for (&row_index, &key) in row_indexes.iter().zip(&keys) {
            latest.insert(key, row_index);
        }

        tracing::debug!(records = records.len(), "Submitting batch to sink");

        let persisted = match self.call_sink(records).await {
            Ok(persisted) => persisted,
            Err(source) => {
                tracing::error!(error = %source, attempted = keys.len(), committed, "Sink rejected batch");
                return Err(ImportError::Sink {
                    source,
                    attempted: keys,
                    committed,
                    skipped: skipped.to_vec(),
                });
            },
        };

        let mut unclaimed = latest.clone();
        for record in persisted {
            let key = record.key();
            match unclaimed.remove(&key) {
                Some(row_index) => {
                    report.push_imported(row_index, record);
                    let earlier = flushed.entry(key).or_default();
                    for &row in earlier.iter() {
                        report.supersede(row, superseded_reason(key, row_index));
                    }
                    earlier.push(row_index);
                },
                None => tracing::warn!(key, "Sink returned a record that was not submitted"),
            }
        }

        for (&row_index, &key) in row_indexes.iter().zip(&keys) {
            match latest.get(&key) {
                Some(&winner) if winner != row_index => {
                    report.push_skipped(row_index, superseded_reason(key, winner));
                    flushed.entry(key).or_default().push(row_index);
                },
                _ if unclaimed.contains_key(&key) => {
                    report.push_skipped(row_index, "not persisted by store");
                },
                _ => {},
            }
        }

        Ok(())
    }

    async fn call_sink(&self, records: Vec<S::Record>) -> Result<Vec<S::Record>, SinkError> {
        match self.config.sink_timeout {
            Some(limit) => tokio::time::timeout(limit, self.sink.save_all(records))
                .await
                .map_err(|_| SinkError::Timeout(limit))?,
            None => self.sink.save_all(records).await,
        }
    }
}

fn superseded_reason(key: i64, winner: usize) -> String {
    format!("duplicate id {} superseded by row {}", key, winner)
}
