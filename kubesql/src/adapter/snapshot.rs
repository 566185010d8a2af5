use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::mapper::traffic_rows;
use crate::metrics::PromQueryResponse;
use crate::registry::RegisteredTable;
use crate::store::{StoreTable, TableStore};
use crate::types::{TableName, TableSchema};

/// Manages a poll-driven table that is rebuilt wholesale each cycle.
///
/// [`refresh`](SnapshotTableAdapter::refresh) builds the replacement table
/// off to the side and publishes it with an atomic handle swap, so readers
/// always see either the previous snapshot or the complete new one. Each
/// successful swap bumps a monotonically increasing generation counter.
pub struct SnapshotTableAdapter<S: TableStore> {
    name: TableName,
    schema: TableSchema,
    store: S,
    current: Mutex<S::Table>,
    generation: AtomicU64,
}

impl<S: TableStore> SnapshotTableAdapter<S> {
    /// Creates the adapter and its initially empty table.
    pub async fn create(store: S, schema: TableSchema) -> SyncResult<Self> {
        let name = schema.name.clone();
        let table = store.create_table(schema.clone()).await?;
        info!(table = %name, "snapshot table adapter created");

        Ok(Self {
            name,
            schema,
            store,
            current: Mutex::new(table),
            generation: AtomicU64::new(0),
        })
    }

    pub fn table_name(&self) -> &TableName {
        &self.name
    }

    /// Returns the number of completed refreshes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns the handle of the currently published table.
    pub async fn current_table(&self) -> S::Table {
        self.current.lock().await.clone()
    }

    /// Rebuilds the table from the given query responses and swaps it in.
    ///
    /// Row insertion into the staging table is best-effort: failures are
    /// logged, the snapshot is published with the rows that landed, and the
    /// failures are reported as one aggregate error. Returns the new
    /// generation on full success.
    pub async fn refresh(&self, responses: &[PromQueryResponse]) -> SyncResult<u64> {
        let staging = self.store.build_table(self.schema.clone());

        let mut errors = Vec::new();
        let mut inserted = 0_usize;
        for response in responses {
            for row in traffic_rows(response) {
                match staging.insert_row(row).await {
                    Ok(()) => inserted += 1,
                    Err(err) => {
                        warn!(
                            table = %self.name,
                            metric = %response.metric_name,
                            error = %err,
                            "failed to stage row, continuing"
                        );
                        errors.push(err);
                    }
                }
            }
        }

        self.store.publish_table(staging.clone()).await?;
        *self.current.lock().await = staging;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            table = %self.name,
            generation,
            rows = inserted,
            "published refreshed table"
        );

        if !errors.is_empty() {
            return Err(SyncError::many(errors));
        }

        Ok(generation)
    }

    pub async fn drop_table(&self) -> SyncResult<()> {
        info!(table = %self.name, "dropping table");
        self.store.drop_table(&self.name).await
    }
}

#[async_trait::async_trait]
impl<S: TableStore> RegisteredTable for SnapshotTableAdapter<S> {
    fn table_name(&self) -> &TableName {
        &self.name
    }

    async fn drop_table(&self) -> SyncResult<()> {
        SnapshotTableAdapter::drop_table(self).await
    }
}
