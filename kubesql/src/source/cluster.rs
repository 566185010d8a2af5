use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::SyncResult;
use crate::source::resources::{LabelSelector, Node, NodeSelectorRequirement, Pod};
use crate::source::selector::{node_matches_requirement, pod_matches_selector};

/// Ad-hoc listing queries against the cluster.
///
/// Affinity mappers resolve selector terms to concrete objects through this
/// trait instead of keeping their own object caches.
pub trait ClusterClient: Clone + Send + Sync + 'static {
    /// Lists the pods whose labels satisfy the selector.
    fn list_pods(
        &self,
        selector: &LabelSelector,
    ) -> impl Future<Output = SyncResult<Vec<Pod>>> + Send;

    /// Lists the nodes whose labels satisfy the requirement.
    fn list_nodes(
        &self,
        requirement: &NodeSelectorRequirement,
    ) -> impl Future<Output = SyncResult<Vec<Node>>> + Send;
}

#[derive(Default)]
struct FakeClusterInner {
    pods: Vec<Pod>,
    nodes: Vec<Node>,
}

/// An in-memory [`ClusterClient`] over a fixed set of objects.
#[derive(Clone, Default)]
pub struct FakeCluster {
    inner: Arc<Mutex<FakeClusterInner>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_pod(&self, pod: Pod) {
        self.inner.lock().await.pods.push(pod);
    }

    pub async fn add_node(&self, node: Node) {
        self.inner.lock().await.nodes.push(node);
    }
}

impl ClusterClient for FakeCluster {
    async fn list_pods(&self, selector: &LabelSelector) -> SyncResult<Vec<Pod>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .pods
            .iter()
            .filter(|pod| pod_matches_selector(pod, selector))
            .cloned()
            .collect())
    }

    async fn list_nodes(&self, requirement: &NodeSelectorRequirement) -> SyncResult<Vec<Node>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .nodes
            .iter()
            .filter(|node| node_matches_requirement(node, requirement))
            .cloned()
            .collect())
    }
}
