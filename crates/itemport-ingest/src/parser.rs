//! Delimited-text row parser
//!
//! Reads RFC 4180 style input (quoted cells may contain the delimiter, doubled
//! quotes and line breaks), binds the header to a [`RecordSchema`] and yields
//! one typed record or one [`RowError`] per data row. Row failures never stop
//! the stream; only a failing reader does.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::marker::PhantomData;
use thiserror::Error;

use crate::record::{Record, TypedRow, Value};
use crate::schema::{ColumnType, HeaderBinding, RecordSchema, SchemaError};

/// Default cell delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Why a single row could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowErrorKind {
    #[error("column count mismatch")]
    ColumnCount { expected: usize, found: usize },

    #[error("invalid integer at column {column}")]
    InvalidInteger { column: String },

    #[error("missing value at column {column}")]
    MissingValue { column: String },

    #[error("unexpected value type at column {column}")]
    TypeMismatch { column: String },

    #[error("invalid UTF-8")]
    InvalidUtf8,

    #[error("malformed row: {0}")]
    Malformed(String),

    /// A quoted cell was still open at the end of the input, so every byte
    /// after its opening quote was read as part of it
    #[error("unterminated quoted field")]
    UnterminatedQuote,

    /// The underlying reader failed; the stream ends after this error
    #[error("read failure: {0}")]
    Read(String),
}

/// A row-level failure, tagged with the 1-based index of the data row
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row_index}: {kind}")]
pub struct RowError {
    pub row_index: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(row_index: usize, kind: RowErrorKind) -> Self {
        Self { row_index, kind }
    }

    /// Human-readable reason, e.g. "invalid integer at column id"
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }

    /// Whether the input can no longer be read past this row
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, RowErrorKind::Read(_) | RowErrorKind::UnterminatedQuote)
    }
}

/// Streaming parser configuration
#[derive(Debug, Clone, Copy)]
pub struct RowParser {
    delimiter: u8,
}

impl Default for RowParser {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl RowParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Read and bind the header, returning a lazy stream over the data rows
    ///
    /// Fails before yielding anything when the input has no header or the
    /// header lacks a required column.
    pub fn parse<'s, R, T>(
        &self,
        input: R,
        schema: &'s RecordSchema,
    ) -> Result<RowStream<'s, R, T>, SchemaError>
    where
        R: Read,
        T: Record,
    {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(QuoteTracker::new(input, self.delimiter));

        let binding = {
            let header = reader
                .headers()
                .map_err(|e| SchemaError::UnreadableHeader(e.to_string()))?
                .clone();
            if reader.get_ref().ended_in_quote() {
                return Err(SchemaError::UnreadableHeader(
                    RowErrorKind::UnterminatedQuote.to_string(),
                ));
            }
            schema.bind(header.iter())?
        };

        tracing::debug!(
            columns = binding.width(),
            delimiter = %char::from(self.delimiter),
            "Header bound to schema"
        );

        Ok(RowStream {
            reader,
            schema,
            binding,
            buffer: StringRecord::new(),
            row_index: 0,
            finished: false,
            _record: PhantomData,
        })
    }

    /// Parse everything eagerly, splitting records from row errors
    pub fn parse_all<R, T>(
        &self,
        input: R,
        schema: &RecordSchema,
    ) -> Result<(Vec<T>, Vec<RowError>), SchemaError>
    where
        R: Read,
        T: Record,
    {
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for row in self.parse::<R, T>(input, schema)? {
            match row {
                Ok(record) => records.push(record),
                Err(err) => errors.push(err),
            }
        }

        Ok((records, errors))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Reader adapter that follows RFC 4180 quoting over the raw bytes
///
/// The csv reader closes an open quoted cell silently at end of input. This
/// keeps enough state to tell afterwards whether the input ended inside one.
struct QuoteTracker<R> {
    inner: R,
    delimiter: u8,
    state: QuoteState,
    eof: bool,
}

impl<R> QuoteTracker<R> {
    fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            state: QuoteState::FieldStart,
            eof: false,
        }
    }

    fn ended_in_quote(&self) -> bool {
        self.eof && self.state == QuoteState::Quoted
    }

    fn advance(&mut self, byte: u8) {
        let boundary = byte == self.delimiter || byte == b'\n' || byte == b'\r';
        self.state = match (self.state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::FieldStart, b'"') | (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            _ if boundary => QuoteState::FieldStart,
            _ => QuoteState::Unquoted,
        };
    }
}

impl<R: Read> Read for QuoteTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.eof = true;
        }
        for &byte in &buf[..n] {
            self.advance(byte);
        }
        Ok(n)
    }
}

/// Lazy, finite, single-pass sequence of parsed rows
pub struct RowStream<'s, R, T> {
    reader: csv::Reader<QuoteTracker<R>>,
    schema: &'s RecordSchema,
    binding: HeaderBinding,
    buffer: StringRecord,
    row_index: usize,
    finished: bool,
    _record: PhantomData<fn() -> T>,
}

impl<R, T> RowStream<'_, R, T> {
    /// 1-based index of the most recently yielded data row (0 before the first)
    pub fn row_index(&self) -> usize {
        self.row_index
    }
}

impl<R: Read, T: Record> RowStream<'_, R, T> {
    fn convert(&self) -> Result<T, RowErrorKind> {
        if self.buffer.len() != self.binding.width() {
            return Err(RowErrorKind::ColumnCount {
                expected: self.binding.width(),
                found: self.buffer.len(),
            });
        }

        let mut values = Vec::with_capacity(self.schema.columns().len());
        for (i, column) in self.schema.columns().iter().enumerate() {
            let cell = self.binding.position(i).and_then(|pos| self.buffer.get(pos));
            let value = match (cell, column.column_type) {
                (None, _) => None,
                (Some(""), ColumnType::Integer) if !column.required => None,
                (Some(raw), ColumnType::Integer) => {
                    let parsed = raw.parse::<i64>().map_err(|_| RowErrorKind::InvalidInteger {
                        column: column.name.clone(),
                    })?;
                    Some(Value::Integer(parsed))
                },
                (Some(raw), ColumnType::Text) => Some(Value::Text(raw.to_string())),
            };
            values.push(value);
        }

        T::from_row(&TypedRow::new(self.schema, values))
    }
}

fn classify(err: &csv::Error) -> RowErrorKind {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => RowErrorKind::InvalidUtf8,
        csv::ErrorKind::Io(io) => RowErrorKind::Read(io.to_string()),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => RowErrorKind::ColumnCount {
            expected: *expected_len as usize,
            found: *len as usize,
        },
        _ => RowErrorKind::Malformed(err.to_string()),
    }
}

impl<R: Read, T: Record> Iterator for RowStream<'_, R, T> {
    type Item = Result<T, RowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let read = self.reader.read_record(&mut self.buffer);
        match read {
            Ok(false) => {
                self.finished = true;
                None
            },
            Ok(true) => {
                self.row_index += 1;
                if self.reader.get_ref().ended_in_quote() {
                    self.finished = true;
                    return Some(Err(RowError::new(self.row_index, RowErrorKind::UnterminatedQuote)));
                }
                Some(self.convert().map_err(|kind| RowError::new(self.row_index, kind)))
            },
            Err(err) => {
                self.row_index += 1;
                let error = RowError::new(self.row_index, classify(&err));
                if error.is_fatal() {
                    self.finished = true;
                }
                Some(Err(error))
            },
        }
    }
}
