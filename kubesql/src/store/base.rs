use std::future::Future;

use crate::error::{SyncError, SyncResult};
use crate::types::{TableName, TableRow, TableSchema};

/// A handle to a single table inside a [`TableStore`].
///
/// Row operations are grouped into brackets: a caller opens a bracket with
/// [`begin`](StoreTable::begin), applies any number of row operations, and
/// either makes them visible with [`commit`](StoreTable::commit) or throws
/// them all away with [`discard`](StoreTable::discard). Readers never observe
/// a half-applied bracket.
///
/// Row operations outside a bracket apply immediately.
pub trait StoreTable: Clone + Send + Sync + 'static {
    /// Returns the schema this table was created with.
    fn schema(&self) -> &TableSchema;

    /// Opens an update bracket.
    fn begin(&self) -> impl Future<Output = SyncResult<()>> + Send;

    /// Atomically makes every operation since [`begin`](StoreTable::begin) visible.
    fn commit(&self) -> impl Future<Output = SyncResult<()>> + Send;

    /// Drops every operation since [`begin`](StoreTable::begin) and returns the
    /// error that caused the bracket to be abandoned.
    fn discard(&self, cause: SyncError) -> impl Future<Output = SyncError> + Send;

    /// Appends a row, validating it against the table schema.
    fn insert_row(&self, row: TableRow) -> impl Future<Output = SyncResult<()>> + Send;

    /// Removes the first row equal to `row`.
    fn delete_row(&self, row: &TableRow) -> impl Future<Output = SyncResult<()>> + Send;

    /// Replaces the first row equal to `old` with `new`.
    fn update_row(
        &self,
        old: &TableRow,
        new: TableRow,
    ) -> impl Future<Output = SyncResult<()>> + Send;
}

/// A collection of named tables.
///
/// Besides plain create/drop, a store supports building a table off to the
/// side with [`build_table`](TableStore::build_table) and swapping it in
/// atomically with [`publish_table`](TableStore::publish_table). Poll-driven
/// tables use this so readers always see either the previous snapshot or the
/// complete new one.
pub trait TableStore: Clone + Send + Sync + 'static {
    type Table: StoreTable;

    /// Creates a new empty table, failing if a table with that name exists.
    fn create_table(
        &self,
        schema: TableSchema,
    ) -> impl Future<Output = SyncResult<Self::Table>> + Send;

    /// Builds a detached table that is not visible through [`table`](TableStore::table)
    /// until published.
    fn build_table(&self, schema: TableSchema) -> Self::Table;

    /// Atomically replaces (or installs) the named table with `table`.
    fn publish_table(&self, table: Self::Table) -> impl Future<Output = SyncResult<()>> + Send;

    /// Removes the named table, failing if it does not exist.
    fn drop_table(&self, name: &TableName) -> impl Future<Output = SyncResult<()>> + Send;

    /// Looks up a table by name.
    fn table(&self, name: &TableName) -> impl Future<Output = Option<Self::Table>> + Send;
}
