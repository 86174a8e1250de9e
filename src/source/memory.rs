//! In-memory cell source backed by a JSON table snapshot.
//!
//! Snapshot layout:
//!
//! ```json
//! {
//!   "CN_ImagingResultData": [
//!     { "Id": 1, "ResultData": "1f8b0800...", "ConclusionData": null }
//!   ]
//! }
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;
use crate::payload::RawCell;

use super::{CellLocator, CellSource};

/// Serves cells from rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCellSource {
    tables: HashMap<String, Vec<Value>>,
}

impl MemoryCellSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to a table, creating the table if needed.
    pub fn with_row(mut self, table: impl Into<String>, row: Value) -> Self {
        self.tables.entry(table.into()).or_default().push(row);
        self
    }

    /// Build a source from a parsed snapshot.
    pub fn from_snapshot(snapshot: Value) -> Result<Self, SourceError> {
        let Value::Object(tables) = snapshot else {
            return Err(SourceError::Backend(
                "snapshot must be a JSON object of tables".to_string(),
            ));
        };

        let mut source = Self::new();
        for (table, rows) in tables {
            let Value::Array(rows) = rows else {
                return Err(SourceError::Backend(format!(
                    "snapshot table {table:?} must be an array of rows"
                )));
            };
            source.tables.insert(table, rows);
        }
        Ok(source)
    }

    /// Build a source from snapshot JSON text.
    pub fn from_snapshot_str(json: &str) -> Result<Self, SourceError> {
        let snapshot = serde_json::from_str(json)
            .map_err(|e| SourceError::Backend(format!("invalid snapshot JSON: {e}")))?;
        Self::from_snapshot(snapshot)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

/// Compare a row's key cell against the requested id.
fn id_matches(value: &Value, id: &str) -> bool {
    match value {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        Value::Bool(b) => b.to_string() == id,
        _ => false,
    }
}

#[async_trait]
impl CellSource for MemoryCellSource {
    async fn fetch(&self, locator: &CellLocator) -> Result<Option<RawCell>, SourceError> {
        let rows = self
            .tables
            .get(&locator.table)
            .ok_or_else(|| SourceError::NotFound(locator.table.clone()))?;

        let cell = rows
            .iter()
            .filter_map(Value::as_object)
            .find(|row| {
                row.get(&locator.id_column)
                    .is_some_and(|v| id_matches(v, &locator.id_value))
            })
            .and_then(|row| row.get(&locator.column))
            .and_then(RawCell::from_json);

        Ok(cell)
    }
}
