use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::types::TableName;

/// A table adapter that has been registered with the engine.
///
/// The registry holds adapters behind this object-safe trait so watch-driven
/// and poll-driven tables can be enumerated and torn down uniformly.
#[async_trait::async_trait]
pub trait RegisteredTable: Send + Sync {
    /// Returns the name of the table this adapter manages.
    fn table_name(&self) -> &TableName;

    /// Drops the managed table from the store.
    async fn drop_table(&self) -> SyncResult<()>;
}

#[derive(Default)]
struct RegistryInner {
    tables: HashMap<TableName, Arc<dyn RegisteredTable>>,
}

/// The set of tables currently managed by the sync engine.
///
/// Registration is create-once: the first adapter registered for a name wins
/// and later attempts are logged and ignored, so concurrent sync loops can
/// race to register without clobbering each other.
#[derive(Clone)]
pub struct TableRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::default())),
        }
    }

    /// Registers an adapter under its table name.
    ///
    /// Returns `true` if the adapter was registered, `false` if a table with
    /// that name was already registered and the call was a no-op.
    pub async fn register(&self, adapter: Arc<dyn RegisteredTable>) -> bool {
        let name = adapter.table_name().clone();
        let mut inner = self.inner.lock().await;
        if inner.tables.contains_key(&name) {
            warn!(table = %name, "table already registered, keeping existing adapter");
            return false;
        }

        debug!(table = %name, "registered table");
        inner.tables.insert(name, adapter);

        true
    }

    /// Looks up the adapter registered under `name`.
    pub async fn get(&self, name: &TableName) -> Option<Arc<dyn RegisteredTable>> {
        let inner = self.inner.lock().await;
        inner.tables.get(name).cloned()
    }

    /// Returns whether a table with the given name is registered.
    pub async fn contains(&self, name: &TableName) -> bool {
        let inner = self.inner.lock().await;
        inner.tables.contains_key(name)
    }

    /// Returns the names of all registered tables, sorted.
    pub async fn table_names(&self) -> Vec<TableName> {
        let inner = self.inner.lock().await;
        let mut names = inner.tables.keys().cloned().collect::<Vec<_>>();
        names.sort();

        names
    }

    /// Unregisters every table and drops it from its store.
    ///
    /// Drop failures are collected and reported together after every table has
    /// been attempted.
    pub async fn drop_all(&self) -> SyncResult<()> {
        let adapters = {
            let mut inner = self.inner.lock().await;
            inner.tables.drain().collect::<Vec<_>>()
        };

        let mut errors = Vec::new();
        for (name, adapter) in adapters {
            if let Err(err) = adapter.drop_table().await {
                warn!(table = %name, error = %err, "failed to drop table");
                errors.push(err);
            }
        }

        if !errors.is_empty() {
            return Err(SyncError::many(errors));
        }

        Ok(())
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubTable {
        name: TableName,
        drops: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl RegisteredTable for StubTable {
        fn table_name(&self) -> &TableName {
            &self.name
        }

        async fn drop_table(&self) -> SyncResult<()> {
            self.drops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn stub(name: &str, drops: Arc<AtomicUsize>) -> Arc<dyn RegisteredTable> {
        Arc::new(StubTable {
            name: TableName::from(name),
            drops,
        })
    }

    #[tokio::test]
    async fn register_is_create_once() {
        let registry = TableRegistry::new();
        let drops = Arc::new(AtomicUsize::new(0));

        let first = stub("pod", drops.clone());
        assert!(registry.register(first.clone()).await);

        let second = stub("pod", drops.clone());
        assert!(!registry.register(second).await);

        // The original registration survives the second attempt.
        let held = registry.get(&TableName::from("pod")).await.unwrap();
        assert!(Arc::ptr_eq(&held, &first));
    }

    #[tokio::test]
    async fn drop_all_empties_the_registry() {
        let registry = TableRegistry::new();
        let drops = Arc::new(AtomicUsize::new(0));
        registry.register(stub("pod", drops.clone())).await;
        registry.register(stub("node", drops.clone())).await;

        registry.drop_all().await.unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert!(registry.table_names().await.is_empty());
    }

    #[tokio::test]
    async fn table_names_are_sorted() {
        let registry = TableRegistry::new();
        let drops = Arc::new(AtomicUsize::new(0));
        registry.register(stub("traffic", drops.clone())).await;
        registry.register(stub("container", drops.clone())).await;
        registry.register(stub("pod", drops)).await;

        assert_eq!(
            registry.table_names().await,
            vec![
                TableName::from("container"),
                TableName::from("pod"),
                TableName::from("traffic")
            ]
        );
    }
}
