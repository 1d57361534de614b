//! Typed records and the `Item` record kind

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::parser::RowErrorKind;
use crate::schema::{ColumnDef, RecordSchema};

/// A converted cell value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
}

/// One data row after type conversion, addressed by schema column name
///
/// Columns that are optional and absent from the header (or empty optional
/// integers) hold no value.
#[derive(Debug, Clone)]
pub struct TypedRow<'s> {
    schema: &'s RecordSchema,
    values: Vec<Option<Value>>,
}

impl<'s> TypedRow<'s> {
    pub(crate) fn new(schema: &'s RecordSchema, values: Vec<Option<Value>>) -> Self {
        Self { schema, values }
    }

    fn value(&self, column: &str) -> Option<&Value> {
        self.schema
            .index_of(column)
            .and_then(|i| self.values.get(i))
            .and_then(Option::as_ref)
    }

    pub fn integer(&self, column: &str) -> Result<i64, RowErrorKind> {
        self.opt_integer(column)?
            .ok_or_else(|| RowErrorKind::MissingValue { column: column.to_string() })
    }

    pub fn opt_integer(&self, column: &str) -> Result<Option<i64>, RowErrorKind> {
        match self.value(column) {
            Some(Value::Integer(v)) => Ok(Some(*v)),
            Some(Value::Text(_)) => Err(RowErrorKind::TypeMismatch { column: column.to_string() }),
            None => Ok(None),
        }
    }

    pub fn text(&self, column: &str) -> Result<&str, RowErrorKind> {
        self.opt_text(column)?
            .ok_or_else(|| RowErrorKind::MissingValue { column: column.to_string() })
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<&str>, RowErrorKind> {
        match self.value(column) {
            Some(Value::Text(v)) => Ok(Some(v.as_str())),
            Some(Value::Integer(_)) => Err(RowErrorKind::TypeMismatch { column: column.to_string() }),
            None => Ok(None),
        }
    }
}

/// A record kind the pipeline can parse, persist and export
///
/// `from_row` and `to_row` are the explicit mappings between the typed record
/// and its tabular form; storage backends provide their own mapping.
pub trait Record: Sized + Send + Sync + 'static {
    /// The schema a file must satisfy to produce this record kind
    fn schema() -> &'static RecordSchema;

    fn from_row(row: &TypedRow<'_>) -> Result<Self, RowErrorKind>;

    /// Cells in schema column order
    fn to_row(&self) -> Vec<String>;

    /// Primary key
    fn key(&self) -> i64;
}

static ITEM_SCHEMA: LazyLock<RecordSchema> = LazyLock::new(|| {
    RecordSchema::from_trusted(vec![ColumnDef::integer("id"), ColumnDef::text("item_name")])
});

/// The sample record kind: an id and a display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub item_name: String,
}

impl Item {
    pub fn new(id: i64, item_name: impl Into<String>) -> Self {
        Self {
            id,
            item_name: item_name.into(),
        }
    }
}

impl Record for Item {
    fn schema() -> &'static RecordSchema {
        &ITEM_SCHEMA
    }

    fn from_row(row: &TypedRow<'_>) -> Result<Self, RowErrorKind> {
        Ok(Self {
            id: row.integer("id")?,
            item_name: row.text("item_name")?.to_string(),
        })
    }

    fn to_row(&self) -> Vec<String> {
        vec![self.id.to_string(), self.item_name.clone()]
    }

    fn key(&self) -> i64 {
        self.id
    }
}

/// An item that has not been stored yet; the store assigns its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub item_name: String,
}

impl ItemDraft {
    /// Surrounding whitespace is dropped, as the CSV reader drops it on import
    pub fn new(item_name: impl Into<String>) -> Self {
        let item_name = item_name.into();
        let trimmed = item_name.trim();
        Self {
            item_name: if trimmed.len() == item_name.len() {
                item_name
            } else {
                trimmed.to_string()
            },
        }
    }

    pub fn with_id(self, id: i64) -> Item {
        Item {
            id,
            item_name: self.item_name,
        }
    }
}
