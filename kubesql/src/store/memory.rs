use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::store::base::{StoreTable, TableStore};
use crate::types::{TableName, TableRow, TableSchema};
use crate::{bail, sync_error};

#[derive(Debug)]
struct MemoryTableInner {
    rows: Vec<TableRow>,
    /// Copy of `rows` that an open bracket mutates instead of the live data.
    staged: Option<Vec<TableRow>>,
}

impl MemoryTableInner {
    /// Returns the row vector that the next operation should touch.
    fn working_rows(&mut self) -> &mut Vec<TableRow> {
        self.staged.as_mut().unwrap_or(&mut self.rows)
    }
}

/// An in-memory table with copy-on-write update brackets.
///
/// [`StoreTable::begin`] snapshots the current rows; subsequent operations
/// mutate the snapshot while readers keep seeing the committed rows.
/// [`StoreTable::commit`] swaps the snapshot in, [`StoreTable::discard`]
/// throws it away.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: Arc<TableSchema>,
    inner: Arc<Mutex<MemoryTableInner>>,
}

impl MemoryTable {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema: Arc::new(schema),
            inner: Arc::new(Mutex::new(MemoryTableInner {
                rows: Vec::new(),
                staged: None,
            })),
        }
    }

    /// Returns a copy of the committed rows.
    ///
    /// Rows staged in an open bracket are not included.
    pub async fn rows(&self) -> Vec<TableRow> {
        self.inner.lock().await.rows.clone()
    }

    /// Returns the number of committed rows.
    pub async fn row_count(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    /// Returns whether both handles point at the same underlying table data.
    pub fn same_table(&self, other: &MemoryTable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn validate_row(&self, row: &TableRow) -> SyncResult<()> {
        if row.values.len() != self.schema.columns.len() {
            bail!(
                ErrorKind::SchemaMismatch,
                "row arity does not match table schema",
                format!(
                    "table '{}' has {} columns but row has {} values",
                    self.schema.name,
                    self.schema.columns.len(),
                    row.values.len()
                )
            );
        }

        for (cell, column) in row.values.iter().zip(self.schema.columns.iter()) {
            if cell.is_null() && !column.nullable {
                bail!(
                    ErrorKind::SchemaMismatch,
                    "null value in non-nullable column",
                    format!("column '{}' of table '{}'", column.name, self.schema.name)
                );
            }
            if !cell.is_compatible_with(column.typ) {
                bail!(
                    ErrorKind::SchemaMismatch,
                    "cell type does not match column type",
                    format!(
                        "column '{}' of table '{}' expects {}",
                        column.name, self.schema.name, column.typ
                    )
                );
            }
        }

        Ok(())
    }
}

impl StoreTable for MemoryTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn begin(&self) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.staged.is_some() {
            bail!(
                ErrorKind::InvalidState,
                "update bracket already open",
                format!("table '{}'", self.schema.name)
            );
        }

        inner.staged = Some(inner.rows.clone());

        Ok(())
    }

    async fn commit(&self) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        let Some(staged) = inner.staged.take() else {
            bail!(
                ErrorKind::InvalidState,
                "commit without an open update bracket",
                format!("table '{}'", self.schema.name)
            );
        };

        inner.rows = staged;

        Ok(())
    }

    async fn discard(&self, cause: SyncError) -> SyncError {
        let mut inner = self.inner.lock().await;
        if inner.staged.take().is_some() {
            debug!(table = %self.schema.name, "discarded update bracket");
        }

        cause
    }

    async fn insert_row(&self, row: TableRow) -> SyncResult<()> {
        self.validate_row(&row)?;

        let mut inner = self.inner.lock().await;
        inner.working_rows().push(row);

        Ok(())
    }

    async fn delete_row(&self, row: &TableRow) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        let rows = inner.working_rows();
        let Some(position) = rows.iter().position(|r| r == row) else {
            return Err(sync_error!(
                ErrorKind::RowNotFound,
                "row to delete not found",
                format!("table '{}', row {}", self.schema.name, row)
            ));
        };

        rows.remove(position);

        Ok(())
    }

    async fn update_row(&self, old: &TableRow, new: TableRow) -> SyncResult<()> {
        self.validate_row(&new)?;

        let mut inner = self.inner.lock().await;
        let rows = inner.working_rows();
        let Some(position) = rows.iter().position(|r| r == old) else {
            return Err(sync_error!(
                ErrorKind::RowNotFound,
                "row to update not found",
                format!("table '{}', row {}", self.schema.name, old)
            ));
        };

        rows[position] = new;

        Ok(())
    }
}

/// An in-memory [`TableStore`] backed by a map of [`MemoryTable`]s.
#[derive(Debug, Clone)]
pub struct MemoryTableStore {
    tables: Arc<Mutex<HashMap<TableName, MemoryTable>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the names of all visible tables, sorted.
    pub async fn table_names(&self) -> Vec<TableName> {
        let tables = self.tables.lock().await;
        let mut names = tables.keys().cloned().collect::<Vec<_>>();
        names.sort();

        names
    }
}

impl Default for MemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore for MemoryTableStore {
    type Table = MemoryTable;

    async fn create_table(&self, schema: TableSchema) -> SyncResult<MemoryTable> {
        let mut tables = self.tables.lock().await;
        if tables.contains_key(&schema.name) {
            bail!(
                ErrorKind::TableAlreadyExists,
                "table already exists",
                format!("table '{}'", schema.name)
            );
        }

        let name = schema.name.clone();
        let table = MemoryTable::new(schema);
        tables.insert(name, table.clone());

        Ok(table)
    }

    fn build_table(&self, schema: TableSchema) -> MemoryTable {
        MemoryTable::new(schema)
    }

    async fn publish_table(&self, table: MemoryTable) -> SyncResult<()> {
        let mut tables = self.tables.lock().await;
        tables.insert(table.schema().name.clone(), table);

        Ok(())
    }

    async fn drop_table(&self, name: &TableName) -> SyncResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.remove(name).is_none() {
            bail!(
                ErrorKind::TableNotFound,
                "table to drop not found",
                format!("table '{name}'")
            );
        }

        Ok(())
    }

    async fn table(&self, name: &TableName) -> Option<MemoryTable> {
        let tables = self.tables.lock().await;
        tables.get(name).cloned()
    }
}
