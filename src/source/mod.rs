//! Raw cell retrieval.
//!
//! The decoder never talks to a database itself. Callers supply a
//! [`CellSource`] that fetches a single column value by table, id column and
//! id value. [`MemoryCellSource`] serves rows from a JSON snapshot.
//!
//! Some views exist under several names or key columns depending on the
//! deployment. [`fetch_first`] tries an ordered list of candidate locators
//! and returns the first non-empty value.

mod memory;

pub use memory::MemoryCellSource;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::payload::RawCell;

/// Maximum length of a table or column identifier.
pub const MAX_IDENTIFIER_LEN: usize = 128;

// =============================================================================
// CellLocator
// =============================================================================

/// Address of one cell: `SELECT column FROM table WHERE id_column = id_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLocator {
    pub table: String,
    pub id_column: String,
    pub id_value: String,
    pub column: String,
}

impl CellLocator {
    /// Create a locator, validating the table and column identifiers.
    ///
    /// Identifiers must match `[A-Za-z_][A-Za-z0-9_.]*` so they can be
    /// interpolated into a query by SQL-backed sources.
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        id_value: impl Into<String>,
        column: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let locator = Self {
            table: table.into(),
            id_column: id_column.into(),
            id_value: id_value.into(),
            column: column.into(),
        };

        validate_identifier("table", &locator.table)?;
        validate_identifier("id_column", &locator.id_column)?;
        validate_identifier("column", &locator.column)?;

        Ok(locator)
    }

    /// Same row and key, different value column.
    pub fn with_column(&self, column: impl Into<String>) -> Result<Self, SourceError> {
        Self::new(&self.table, &self.id_column, &self.id_value, column)
    }
}

impl std::fmt::Display for CellLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} where {} = {}",
            self.table, self.column, self.id_column, self.id_value
        )
    }
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), SourceError> {
    let mut chars = value.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

    if valid_start && valid_rest && value.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(SourceError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

// =============================================================================
// CellSource Trait
// =============================================================================

/// Fetches raw cell values from a backing store.
#[async_trait]
pub trait CellSource: Send + Sync {
    /// Fetch a single cell.
    ///
    /// Returns `Ok(None)` when the row exists but the cell is NULL, or when
    /// no row matches the id.
    async fn fetch(&self, locator: &CellLocator) -> Result<Option<RawCell>, SourceError>;
}

/// Try candidate locators in order and return the first non-empty cell.
///
/// Errors on individual candidates are logged and skipped. If every
/// candidate fails with an error, the last error is returned.
pub async fn fetch_first<S: CellSource + ?Sized>(
    source: &S,
    candidates: &[CellLocator],
) -> Result<Option<RawCell>, SourceError> {
    let mut last_error = None;
    let mut failures = 0usize;

    for candidate in candidates {
        match source.fetch(candidate).await {
            Ok(Some(cell)) if !cell.is_empty() => return Ok(Some(cell)),
            Ok(_) => debug!(candidate = %candidate, "Candidate cell is empty"),
            Err(e) => {
                warn!(candidate = %candidate, error = %e, "Candidate lookup failed");
                failures += 1;
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if failures == candidates.len() => Err(e),
        _ => Ok(None),
    }
}

// =============================================================================
// Tests
// =============================================================================
