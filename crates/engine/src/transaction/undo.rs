//! Per-transaction undo log
//!
//! Writes are applied to the store in place. Each write records its inverse
//! here, one entry per affected row; rollback replays the entries newest
//! first. Only rows this transaction touched are reversed, so writes other
//! sessions commit to the same table survive a rollback even when no lock
//! protects the table (lock mode OFF).

use crate::storage::{RowId, TableStore, UpdatedCells};
use strata_core::{Row, TableId, Value};

/// Inverse of one row-level write
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    /// A row was inserted; undo removes it
    Inserted {
        /// Table written
        table: TableId,
        /// Inserted row
        row: RowId,
    },
    /// A cell was overwritten; undo puts the previous value back
    Updated {
        /// Table written
        table: TableId,
        /// Updated row
        row: RowId,
        /// Column index
        column: usize,
        /// Value before the update
        previous: Value,
    },
    /// A row was deleted; undo re-inserts it in its original place
    Deleted {
        /// Table written
        table: TableId,
        /// Deleted row
        row: RowId,
        /// Cells of the deleted row
        values: Row,
    },
}

impl UndoEntry {
    /// Table the entry belongs to
    pub fn table(&self) -> &TableId {
        match self {
            UndoEntry::Inserted { table, .. }
            | UndoEntry::Updated { table, .. }
            | UndoEntry::Deleted { table, .. } => table,
        }
    }

    fn undo(self, store: &TableStore) -> bool {
        match self {
            UndoEntry::Inserted { table, row } => store.remove_row(&table, row),
            UndoEntry::Updated {
                table,
                row,
                column,
                previous,
            } => store.set_cell(&table, row, column, previous),
            UndoEntry::Deleted { table, row, values } => store.reinsert(&table, row, values),
        }
    }
}

/// Row-level inverses of every write in a transaction, oldest first
#[derive(Debug, Default)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
}

impl UndoLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the insertion of `row`
    pub fn record_insert(&mut self, table: &TableId, row: RowId) {
        self.entries.push(UndoEntry::Inserted {
            table: table.clone(),
            row,
        });
    }

    /// Record the cells an update overwrote
    pub fn record_update(&mut self, table: &TableId, cells: UpdatedCells) {
        let column = cells.column;
        self.entries
            .extend(cells.previous.into_iter().map(|(row, previous)| UndoEntry::Updated {
                table: table.clone(),
                row,
                column,
                previous,
            }));
    }

    /// Record rows removed by a delete
    pub fn record_delete(&mut self, table: &TableId, rows: Vec<(RowId, Row)>) {
        self.entries
            .extend(rows.into_iter().map(|(row, values)| UndoEntry::Deleted {
                table: table.clone(),
                row,
                values,
            }));
    }

    /// Recorded entries, oldest first
    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    /// Number of recorded row writes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reverse every recorded write, newest first, and empty the log
    ///
    /// Returns the number of writes reversed. Rows removed by another
    /// session in the meantime are skipped.
    pub fn apply(&mut self, store: &TableStore) -> usize {
        let mut reversed = 0;
        while let Some(entry) = self.entries.pop() {
            if entry.undo(store) {
                reversed += 1;
            }
        }
        reversed
    }

    /// Discard every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
