use std::future::Future;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::mapper::RowMapper;
use crate::registry::RegisteredTable;
use crate::source::SourceObject;
use crate::store::{StoreTable, TableStore};
use crate::types::{TableName, TableRow};

/// Applies watch events for one resource kind to its table.
///
/// Every event is projected through the mapper and applied as a row delta.
/// Fan-out events touch several rows; those are applied inside one update
/// bracket so readers never observe a partially applied event.
pub struct SyncTableAdapter<M, S>
where
    M: RowMapper,
    S: TableStore,
{
    name: TableName,
    store: S,
    table: S::Table,
    mapper: M,
}

impl<M, S> SyncTableAdapter<M, S>
where
    M: RowMapper,
    M::Source: SourceObject,
    S: TableStore,
{
    pub fn new(store: S, table: S::Table, mapper: M) -> Self {
        let name = table.schema().name.clone();
        info!(table = %name, "table adapter created");

        Self {
            name,
            store,
            table,
            mapper,
        }
    }

    pub fn table_name(&self) -> &TableName {
        &self.name
    }

    /// Inserts the rows projected from `source`.
    ///
    /// Within a bracket the application is best-effort: a failed row is
    /// logged and skipped, the remaining rows still land, and the failures
    /// are reported as one aggregate error after the commit.
    pub async fn insert(&self, source: &M::Source) -> SyncResult<()> {
        let mut rows = self.mapper.project(source).await?;
        debug!(
            table = %self.name,
            object = %source.identity(),
            rows = rows.len(),
            "applying insert"
        );

        match rows.len() {
            0 => Ok(()),
            1 => {
                let row = rows.remove(0);
                self.table.insert_row(row).await
            }
            _ => {
                self.apply_bracketed(source, rows, |table, row| async move {
                    table.insert_row(row).await
                })
                .await
            }
        }
    }

    /// Deletes the rows projected from `source`, with the same best-effort
    /// policy as [`insert`](SyncTableAdapter::insert).
    pub async fn delete(&self, source: &M::Source) -> SyncResult<()> {
        let rows = self.mapper.project(source).await?;
        debug!(
            table = %self.name,
            object = %source.identity(),
            rows = rows.len(),
            "applying delete"
        );

        match rows.len() {
            0 => Ok(()),
            1 => self.table.delete_row(&rows[0]).await,
            _ => {
                self.apply_bracketed(source, rows, |table, row| async move {
                    table.delete_row(&row).await
                })
                .await
            }
        }
    }

    /// Replaces the rows projected from `old` with the rows projected from
    /// `new`.
    ///
    /// When both sides project to a single row this is a row-level replace.
    /// Otherwise the whole swap runs inside one bracket and is discarded
    /// wholesale on any failure, leaving the old rows in place.
    pub async fn update(&self, old: &M::Source, new: &M::Source) -> SyncResult<()> {
        let old_rows = self.mapper.project(old).await?;
        let mut new_rows = self.mapper.project(new).await?;
        debug!(
            table = %self.name,
            object = %new.identity(),
            old_rows = old_rows.len(),
            new_rows = new_rows.len(),
            "applying update"
        );

        if old_rows.len() == 1 && new_rows.len() == 1 {
            let new_row = new_rows.remove(0);
            return self.table.update_row(&old_rows[0], new_row).await;
        }

        self.table.begin().await?;

        let mut errors = Vec::new();
        for row in &old_rows {
            if let Err(err) = self.table.delete_row(row).await {
                errors.push(err);
            }
        }
        for row in new_rows {
            if let Err(err) = self.table.insert_row(row).await {
                errors.push(err);
            }
        }

        if !errors.is_empty() {
            warn!(
                table = %self.name,
                object = %new.identity(),
                failures = errors.len(),
                "update failed, discarding bracket"
            );
            return Err(self.table.discard(SyncError::many(errors)).await);
        }

        self.table.commit().await
    }

    /// Drops the managed table from the store.
    pub async fn drop_table(&self) -> SyncResult<()> {
        info!(table = %self.name, "dropping table");
        self.store.drop_table(&self.name).await
    }

    async fn apply_bracketed<F, Fut>(
        &self,
        source: &M::Source,
        rows: Vec<TableRow>,
        op: F,
    ) -> SyncResult<()>
    where
        F: Fn(S::Table, TableRow) -> Fut,
        Fut: Future<Output = SyncResult<()>>,
    {
        self.table.begin().await?;

        let mut errors = Vec::new();
        for row in rows {
            if let Err(err) = op(self.table.clone(), row).await {
                warn!(
                    table = %self.name,
                    object = %source.identity(),
                    error = %err,
                    "row operation failed, continuing with remaining rows"
                );
                errors.push(err);
            }
        }

        self.table.commit().await?;

        if !errors.is_empty() {
            return Err(SyncError::many(errors));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl<M, S> RegisteredTable for SyncTableAdapter<M, S>
where
    M: RowMapper + Send + Sync,
    M::Source: SourceObject,
    S: TableStore,
{
    fn table_name(&self) -> &TableName {
        &self.name
    }

    async fn drop_table(&self) -> SyncResult<()> {
        SyncTableAdapter::drop_table(self).await
    }
}
