//! In-memory table store
//!
//! Tables live in a DashMap keyed by [`TableId`]. Writes are applied in
//! place: there is no versioning, so what a reader sees is decided entirely
//! by the table locks held around the access.
//!
//! # Design
//!
//! - DashMap: sharded by table, concurrent access to different tables
//! - Every row carries a [`RowId`] that never changes and is never reused
//! - Rows are kept in ascending `RowId` order, which is insertion order
//! - Writes report what they replaced so the undo log can reverse exactly
//!   those rows and nothing written by other sessions

use dashmap::DashMap;
use std::fmt;
use strata_core::error::{Error, Result};
use strata_core::{Row, TableId, Value};

/// Stable identity of a stored row within its table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
    /// Raw id
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Cells overwritten by an update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedCells {
    /// Index of the updated column
    pub column: usize,
    /// Each changed row with the value it held before
    pub previous: Vec<(RowId, Value)>,
}

/// A single table: column names and rows
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Upper-case column names, in order
    pub(crate) columns: Vec<String>,
    /// Rows in ascending id order
    pub(crate) rows: Vec<(RowId, Row)>,
    next_row: u64,
}

impl Table {
    fn column_index(&self, table: &TableId, column: &str) -> Result<usize> {
        let wanted = column.trim().to_ascii_uppercase();
        self.columns
            .iter()
            .position(|c| *c == wanted)
            .ok_or_else(|| Error::ColumnNotFound {
                table: table.clone(),
                column: wanted,
            })
    }

    fn position(&self, row: RowId) -> std::result::Result<usize, usize> {
        self.rows.binary_search_by_key(&row, |(id, _)| *id)
    }
}

/// Catalog and row storage for every table of a database
///
/// # Thread Safety
///
/// Every operation is atomic with respect to a single table. Isolation
/// between statements is the lock manager's job, not the store's.
#[derive(Debug, Default)]
pub struct TableStore {
    tables: DashMap<TableId, Table>,
}

impl TableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given columns
    pub fn create_table(&self, table: &TableId, columns: &[String]) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.tables.entry(table.clone()) {
            Entry::Occupied(_) => Err(Error::TableExists {
                table: table.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Table {
                    columns: columns
                        .iter()
                        .map(|c| c.trim().to_ascii_uppercase())
                        .collect(),
                    ..Table::default()
                });
                Ok(())
            }
        }
    }

    /// Check if a table exists
    pub fn contains(&self, table: &TableId) -> bool {
        self.tables.contains_key(table)
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Column names of a table
    pub fn columns(&self, table: &TableId) -> Result<Vec<String>> {
        self.with_table(table, |t| t.columns.clone())
    }

    /// All rows of a table, in insertion order
    pub fn rows(&self, table: &TableId) -> Result<Vec<Row>> {
        self.with_table(table, |t| t.rows.iter().map(|(_, row)| row.clone()).collect())
    }

    /// Append a row and return its id
    pub fn insert(&self, table: &TableId, row: Row) -> Result<RowId> {
        self.with_table_mut(table, |t| {
            if row.len() != t.columns.len() {
                return Err(Error::ColumnCountMismatch {
                    table: table.clone(),
                    expected: t.columns.len(),
                    actual: row.len(),
                });
            }
            let id = RowId(t.next_row);
            t.next_row += 1;
            t.rows.push((id, row));
            Ok(id)
        })?
    }

    /// Set `column` to `value` in every row
    pub fn update_all(&self, table: &TableId, column: &str, value: &Value) -> Result<UpdatedCells> {
        self.with_table_mut(table, |t| {
            let index = t.column_index(table, column)?;
            let previous = t
                .rows
                .iter_mut()
                .map(|(id, row)| (*id, std::mem::replace(&mut row[index], value.clone())))
                .collect();
            Ok(UpdatedCells {
                column: index,
                previous,
            })
        })?
    }

    /// Remove every row, returning the removed rows with their ids
    pub fn delete_all(&self, table: &TableId) -> Result<Vec<(RowId, Row)>> {
        self.with_table_mut(table, |t| std::mem::take(&mut t.rows))
    }

    // ========================================================================
    // Undo primitives
    //
    // Each reverses one earlier write. A row or table that has gone away in
    // the meantime is skipped.
    // ========================================================================

    /// Remove the row with id `row`; returns `false` if it is gone
    pub fn remove_row(&self, table: &TableId, row: RowId) -> bool {
        let Some(mut t) = self.tables.get_mut(table) else {
            return false;
        };
        match t.position(row) {
            Ok(index) => {
                t.rows.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Put `value` back into one cell; returns `false` if the row is gone
    pub fn set_cell(&self, table: &TableId, row: RowId, column: usize, value: Value) -> bool {
        let Some(mut t) = self.tables.get_mut(table) else {
            return false;
        };
        let Ok(index) = t.position(row) else {
            return false;
        };
        match t.rows[index].1.get_mut(column) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Re-insert a deleted row at its original place in id order
    ///
    /// Returns `false` if a row with that id is already present.
    pub fn reinsert(&self, table: &TableId, row: RowId, values: Row) -> bool {
        let Some(mut t) = self.tables.get_mut(table) else {
            return false;
        };
        match t.position(row) {
            Ok(_) => false,
            Err(index) => {
                t.rows.insert(index, (row, values));
                true
            }
        }
    }

    fn with_table<R>(&self, table: &TableId, f: impl FnOnce(&Table) -> R) -> Result<R> {
        self.tables
            .get(table)
            .map(|t| f(&*t))
            .ok_or_else(|| Error::TableNotFound {
                table: table.clone(),
            })
    }

    fn with_table_mut<R>(&self, table: &TableId, f: impl FnOnce(&mut Table) -> R) -> Result<R> {
        self.tables
            .get_mut(table)
            .map(|mut t| f(&mut *t))
            .ok_or_else(|| Error::TableNotFound {
                table: table.clone(),
            })
    }
}
