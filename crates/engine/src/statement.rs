//! Typed statements and their outputs
//!
//! SQL text is parsed elsewhere; the engine receives a [`Statement`] and
//! answers with an [`Output`]. Each statement declares the tables it touches
//! and whether it reads or writes them, which is all the coordinator needs
//! to decide what to lock.

use smallvec::{smallvec, SmallVec};
use strata_concurrency::StatementKind;
use strata_core::{Row, TableId, Value};

/// Tables a statement touches, with how it touches them
pub type TableAccess = SmallVec<[(TableId, StatementKind); 2]>;

/// A statement executed by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create a table (catalog only, takes no table lock)
    CreateTable {
        /// Table to create
        table: TableId,
        /// Column names
        columns: Vec<String>,
    },
    /// Append one row
    Insert {
        /// Target table
        table: TableId,
        /// One value per column
        values: Row,
    },
    /// Read every row
    Select {
        /// Source table
        table: TableId,
    },
    /// Set a column in every row
    Update {
        /// Target table
        table: TableId,
        /// Column to set
        column: String,
        /// New value
        value: Value,
    },
    /// Remove every row
    Delete {
        /// Target table
        table: TableId,
    },
}

impl Statement {
    /// `CREATE TABLE table(columns...)`
    pub fn create_table<C: Into<String>>(
        table: impl Into<TableId>,
        columns: impl IntoIterator<Item = C>,
    ) -> Self {
        Statement::CreateTable {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// `INSERT INTO table VALUES(values...)`
    pub fn insert<V: Into<Value>>(
        table: impl Into<TableId>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Statement::Insert {
            table: table.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `SELECT * FROM table`
    pub fn select(table: impl Into<TableId>) -> Self {
        Statement::Select {
            table: table.into(),
        }
    }

    /// `UPDATE table SET column=value`
    pub fn update(
        table: impl Into<TableId>,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Statement::Update {
            table: table.into(),
            column: column.into(),
            value: value.into(),
        }
    }

    /// `DELETE FROM table`
    pub fn delete(table: impl Into<TableId>) -> Self {
        Statement::Delete {
            table: table.into(),
        }
    }

    /// Table the statement targets
    pub fn table(&self) -> &TableId {
        match self {
            Statement::CreateTable { table, .. }
            | Statement::Insert { table, .. }
            | Statement::Select { table }
            | Statement::Update { table, .. }
            | Statement::Delete { table } => table,
        }
    }

    /// Tables to lock before executing, with read/write intent
    ///
    /// Catalog statements lock nothing.
    pub fn table_access(&self) -> TableAccess {
        match self {
            Statement::CreateTable { .. } => SmallVec::new(),
            Statement::Select { table } => smallvec![(table.clone(), StatementKind::Read)],
            Statement::Insert { table, .. }
            | Statement::Update { table, .. }
            | Statement::Delete { table } => smallvec![(table.clone(), StatementKind::Write)],
        }
    }

    /// Check if the statement only reads
    pub fn is_read_only(&self) -> bool {
        self.table_access()
            .iter()
            .all(|(_, kind)| *kind == StatementKind::Read)
    }
}

/// Result of executing a statement or command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// No result
    Unit,
    /// Rows returned by a query
    Rows(Vec<Row>),
    /// Number of rows inserted, updated or deleted
    Affected(u64),
    /// A single value (e.g. `CALL LOCK_MODE()`)
    Value(Value),
}

impl Output {
    /// Rows, if this is a query result
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Output::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Affected row count, if this is an update result
    pub fn affected(&self) -> Option<u64> {
        match self {
            Output::Affected(n) => Some(*n),
            _ => None,
        }
    }

    /// The single value of a one-row, one-column result or a scalar output
    pub fn single_value(&self) -> Option<&Value> {
        match self {
            Output::Value(v) => Some(v),
            Output::Rows(rows) if rows.len() == 1 && rows[0].len() == 1 => Some(&rows[0][0]),
            _ => None,
        }
    }
}
