//! Record schemas
//!
//! A [`RecordSchema`] declares which columns one kind of tabular record
//! expects, their types, and whether each must appear in the header. The
//! parser binds a file's header against the schema once, up front, and then
//! converts every data row through that binding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage type of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer
    Integer,
    /// Trimmed UTF-8 text
    Text,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("integer"),
            ColumnType::Text => f.write_str("text"),
        }
    }
}

/// One column of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub required: bool,
    pub column_type: ColumnType,
}

impl ColumnDef {
    /// Required integer column
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            column_type: ColumnType::Integer,
        }
    }

    /// Required text column
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            column_type: ColumnType::Text,
        }
    }

    /// Mark the column as optional in the header
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn matches(&self, header_cell: &str) -> bool {
        self.name.trim().to_lowercase() == header_cell.trim().to_lowercase()
    }
}

/// Errors raised while building a schema or binding a header to it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Schema must declare at least one column")]
    NoColumns,

    #[error("Column name cannot be empty")]
    EmptyColumnName,

    #[error("Column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("Input has no header row")]
    MissingHeader,

    #[error("Header is missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Header could not be read: {0}")]
    UnreadableHeader(String),
}

/// Ordered set of column definitions for one record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    columns: Vec<ColumnDef>,
}

impl RecordSchema {
    /// Build a schema, rejecting empty or duplicate column names
    ///
    /// Names are compared the same way headers are matched: trimmed and
    /// case-insensitive, so `ID` and `id` count as duplicates.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::NoColumns);
        }

        for (i, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(SchemaError::EmptyColumnName);
            }
            if columns[..i].iter().any(|earlier| earlier.matches(&column.name)) {
                return Err(SchemaError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(Self { columns })
    }

    /// Build a schema from column definitions known to be valid at compile time
    pub(crate) fn from_trusted(columns: Vec<ColumnDef>) -> Self {
        debug_assert!(Self::new(columns.clone()).is_ok(), "invalid built-in schema");
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Position of the column called `name` within the schema
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.matches(name))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.index_of(name).map(|i| &self.columns[i])
    }

    /// Column names in declaration order, used as the header on export
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Match a header row against the schema
    ///
    /// Every required column must be present. Extra header cells are allowed
    /// and ignored; when a name appears twice the first occurrence wins.
    pub fn bind<'h, I>(&self, header: I) -> Result<HeaderBinding, SchemaError>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let cells: Vec<&str> = header.into_iter().collect();

        if cells.is_empty() || cells.iter().all(|c| c.trim().is_empty()) {
            return Err(SchemaError::MissingHeader);
        }

        let positions: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|column| cells.iter().position(|cell| column.matches(cell)))
            .collect();

        let missing: Vec<String> = self
            .columns
            .iter()
            .zip(&positions)
            .filter(|(column, position)| column.required && position.is_none())
            .map(|(column, _)| column.name.clone())
            .collect();

        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns { missing });
        }

        Ok(HeaderBinding {
            positions,
            width: cells.len(),
        })
    }
}

/// Result of matching one file's header to a schema
///
/// `positions[i]` is the cell index holding schema column `i`, or `None` for
/// an optional column the header does not carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBinding {
    positions: Vec<Option<usize>>,
    width: usize,
}

impl HeaderBinding {
    /// Number of cells in the header; every data row must have exactly this many
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn position(&self, column: usize) -> Option<usize> {
        self.positions.get(column).copied().flatten()
    }
}
