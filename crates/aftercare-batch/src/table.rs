//! In-memory table abstraction for batch classification.
//!
//! The batch layer receives an already-parsed table (file I/O lives at the
//! CLI boundary) and returns the same rows with three result columns
//! appended per flow, in the flow registry's canonical order.

use thiserror::Error;

use aftercare_core::{FieldValue, FlowRegistry, PatientRecord};

/// Sentinel written into all three result cells of a failed (row, flow) unit.
pub const UNAVAILABLE: &str = "N/A";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("row has {got} cells, expected {expected}")]
    RowWidth { expected: usize, got: usize },
}

/// An ordered header plus rows of string cells. Row order is never changed
/// by classification.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) -> Result<(), TableError> {
        if cells.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                got: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// View one row as an open patient record, pairing header cells with
    /// row cells in column order.
    pub fn record_for_row(&self, idx: usize) -> PatientRecord {
        self.columns
            .iter()
            .zip(&self.rows[idx])
            .map(|(col, cell)| (col.clone(), FieldValue::Text(cell.clone())))
            .collect()
    }

    /// Append the per-flow result column headers in canonical flow order.
    /// Only the result assembler calls this; rows grow via
    /// [`Table::extend_row`] to match.
    pub(crate) fn append_result_columns(&mut self, flows: &FlowRegistry) {
        for flow in flows.all() {
            self.columns.push(format!("{}_risk_level", flow.id));
            self.columns.push(format!("{}_risk_reason", flow.id));
            self.columns.push(format!("{}_recommendation", flow.id));
        }
    }

    pub(crate) fn extend_row(&mut self, idx: usize, cells: [String; 3]) {
        self.rows[idx].extend(cells);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_width_enforced() {
        let mut table = Table::new(vec!["age".into(), "gender".into()]);
        assert!(table.push_row(vec!["30".into(), "หญิง".into()]).is_ok());
        assert!(matches!(
            table.push_row(vec!["31".into()]),
            Err(TableError::RowWidth {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn record_for_row_preserves_column_order() {
        let mut table = Table::new(vec!["age".into(), "swelling_status".into()]);
        table
            .push_row(vec!["30".into(), "ใช่".into()])
            .unwrap();

        let record = table.record_for_row(0);
        let ids: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(ids, vec!["age", "swelling_status"]);
        assert_eq!(
            record.get("swelling_status"),
            Some(&FieldValue::Text("ใช่".into()))
        );
    }

    #[test]
    fn result_columns_follow_flow_order() {
        let flows = FlowRegistry::builtin();
        let mut table = Table::new(vec!["age".into()]);
        table.append_result_columns(&flows);

        assert_eq!(table.columns()[1], "pain_risk_level");
        assert_eq!(table.columns()[2], "pain_risk_reason");
        assert_eq!(table.columns()[3], "pain_recommendation");
        assert_eq!(table.columns().len(), 1 + flows.len() * 3);
    }
}
