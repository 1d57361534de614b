//! Import reports

use serde::Serialize;

/// Outcome of one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RowOutcome<R> {
    #[serde(rename_all = "camelCase")]
    Imported { row_index: usize, record: R },
    #[serde(rename_all = "camelCase")]
    Skipped { row_index: usize, reason: String },
}

impl<R> RowOutcome<R> {
    pub fn row_index(&self) -> usize {
        match self {
            RowOutcome::Imported { row_index, .. } | RowOutcome::Skipped { row_index, .. } => {
                *row_index
            },
        }
    }
}

/// Aggregated result of one import call, rows ordered by row index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport<R> {
    imported_count: usize,
    rows: Vec<RowOutcome<R>>,
}

impl<R> Default for ImportReport<R> {
    fn default() -> Self {
        Self {
            imported_count: 0,
            rows: Vec::new(),
        }
    }
}

impl<R> ImportReport<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_imported(&mut self, row_index: usize, record: R) {
        self.imported_count += 1;
        self.rows.push(RowOutcome::Imported { row_index, record });
    }

    pub(crate) fn push_skipped(&mut self, row_index: usize, reason: impl Into<String>) {
        self.rows.push(RowOutcome::Skipped {
            row_index,
            reason: reason.into(),
        });
    }

    /// Mark a row as skipped, whatever its outcome so far
    pub(crate) fn supersede(&mut self, row_index: usize, reason: impl Into<String>) {
        let Some(row) = self.rows.iter_mut().find(|row| row.row_index() == row_index) else {
            return;
        };
        if matches!(row, RowOutcome::Imported { .. }) {
            self.imported_count -= 1;
        }
        *row = RowOutcome::Skipped {
            row_index,
            reason: reason.into(),
        };
    }

    pub(crate) fn finish(mut self) -> Self {
        self.rows.sort_by_key(RowOutcome::row_index);
        self
    }

    pub fn imported_count(&self) -> usize {
        self.imported_count
    }

    pub fn skipped_count(&self) -> usize {
        self.rows.len() - self.imported_count
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[RowOutcome<R>] {
        &self.rows
    }

    pub fn imported(&self) -> impl Iterator<Item = &R> {
        self.rows.iter().filter_map(|row| match row {
            RowOutcome::Imported { record, .. } => Some(record),
            RowOutcome::Skipped { .. } => None,
        })
    }

    /// `(row_index, reason)` for every skipped row
    pub fn skipped(&self) -> impl Iterator<Item = (usize, &str)> {
        self.rows.iter().filter_map(|row| match row {
            RowOutcome::Skipped { row_index, reason } => Some((*row_index, reason.as_str())),
            RowOutcome::Imported { .. } => None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::record::Item;

    #[test]
    fn test_finish_orders_rows_and_counts() {
        let mut report = ImportReport::new();
        report.push_skipped(3, "invalid integer at column id");
        report.push_imported(1, Item::new(1, "Pen"));
        report.push_imported(2, Item::new(2, "Notebook"));
        let report = report.finish();

        assert_eq!(report.imported_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(
            report.rows().iter().map(RowOutcome::row_index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(
            report.skipped().collect::<Vec<_>>(),
            vec![(3, "invalid integer at column id")]
        );
    }

    #[test]
    fn test_supersede_moves_row_to_skipped() {
        let mut report = ImportReport::new();
        report.push_imported(1, Item::new(1, "a"));
        report.push_imported(3, Item::new(1, "c"));
        report.supersede(1, "duplicate id 1 superseded by row 3");
        report.supersede(2, "no such row");
        report.supersede(1, "duplicate id 1 superseded by row 5");
        let report = report.finish();

        assert_eq!(report.imported_count(), 1);
        assert_eq!(report.total_rows(), 2);
        assert_eq!(
            report.skipped().collect::<Vec<_>>(),
            vec![(1, "duplicate id 1 superseded by row 5")]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut report = ImportReport::new();
        report.push_imported(1, Item::new(1, "Pen"));
        report.push_skipped(2, "column count mismatch");

        let json = serde_json::to_value(report.finish()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "importedCount": 1,
                "rows": [
                    { "outcome": "imported", "rowIndex": 1, "record": { "id": 1, "itemName": "Pen" } },
                    { "outcome": "skipped", "rowIndex": 2, "reason": "column count mismatch" }
                ]
            })
        );
    }
}
