use tracing::warn;

use crate::error::SyncResult;
use crate::mapper::base::{RowMapper, timestamp_cell};
use crate::source::{ClusterClient, Pod};
use crate::types::{Cell, ColumnSchema, ColumnType, TableName, TableRow, TableSchema};

/// Schema of the `node_affinity` table.
pub fn node_affinity_table_schema() -> TableSchema {
    TableSchema::new(
        TableName::from("node_affinity"),
        vec![
            ColumnSchema::new("uid", ColumnType::Text, false, true),
            ColumnSchema::new("name", ColumnType::Text, false, true),
            ColumnSchema::new("namespace", ColumnType::Text, false, false),
            ColumnSchema::new("weight", ColumnType::I32, false, false),
            ColumnSchema::new("affinity", ColumnType::Text, false, true),
            ColumnSchema::new("created_at", ColumnType::TimestampTz, true, false),
        ],
    )
}

/// One row per preferred node-affinity expression and matched node.
///
/// Every match expression of every preferred scheduling term is resolved
/// through the cluster client. A failed lookup skips that expression and
/// keeps projecting the rest.
#[derive(Debug, Clone)]
pub struct NodeAffinityMapper<C: ClusterClient> {
    cluster: C,
}

impl<C: ClusterClient> NodeAffinityMapper<C> {
    pub fn new(cluster: C) -> Self {
        Self { cluster }
    }
}

impl<C: ClusterClient> RowMapper for NodeAffinityMapper<C> {
    type Source = Pod;

    async fn project(&self, pod: &Pod) -> SyncResult<Vec<TableRow>> {
        let Some(node_affinity) = pod
            .spec
            .affinity
            .as_ref()
            .and_then(|a| a.node_affinity.as_ref())
        else {
            return Ok(Vec::new());
        };

        let mut rows = Vec::new();
        for term in &node_affinity.preferred {
            for requirement in &term.match_expressions {
                let matched = match self.cluster.list_nodes(requirement).await {
                    Ok(matched) => matched,
                    Err(err) => {
                        warn!(
                            pod = %pod.meta.name,
                            key = %requirement.key,
                            error = %err,
                            "node lookup for affinity expression failed, skipping expression"
                        );
                        continue;
                    }
                };

                for node in matched {
                    rows.push(TableRow::new(vec![
                        Cell::from(pod.meta.uid.as_str()),
                        Cell::from(pod.meta.name.as_str()),
                        Cell::from(pod.meta.namespace.as_str()),
                        Cell::from(term.weight),
                        Cell::from(node.meta.name.as_str()),
                        timestamp_cell(pod.meta.created_at),
                    ]));
                }
            }
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::{
        Affinity, FakeCluster, LabelSelector, Node, NodeAffinity, NodeSelectorOperator,
        NodeSelectorRequirement, ObjectMeta, PodSpec, PreferredSchedulingTerm,
    };
    use crate::sync_error;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Fails the first node listing, then delegates to the wrapped fake.
    #[derive(Clone)]
    struct FirstNodeLookupFails {
        inner: FakeCluster,
        failed: Arc<AtomicBool>,
    }

    impl FirstNodeLookupFails {
        fn new(inner: FakeCluster) -> Self {
            Self {
                inner,
                failed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl ClusterClient for FirstNodeLookupFails {
        async fn list_pods(&self, selector: &LabelSelector) -> SyncResult<Vec<Pod>> {
            self.inner.list_pods(selector).await
        }

        async fn list_nodes(&self, requirement: &NodeSelectorRequirement) -> SyncResult<Vec<Node>> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(sync_error!(
                    ErrorKind::SourceLookupFailed,
                    "node listing failed"
                ));
            }
            self.inner.list_nodes(requirement).await
        }
    }

    fn zone_node(name: &str, zone: &str) -> Node {
        let mut labels = BTreeMap::new();
        labels.insert("zone".to_string(), zone.to_string());
        Node {
            meta: ObjectMeta {
                name: name.into(),
                labels,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pod_preferring_zone(zone: &str) -> Pod {
        Pod {
            meta: ObjectMeta {
                uid: "u1".into(),
                name: "web-1".into(),
                namespace: "prod".into(),
                ..Default::default()
            },
            spec: PodSpec {
                affinity: Some(Affinity {
                    pod_affinity: None,
                    node_affinity: Some(NodeAffinity {
                        preferred: vec![PreferredSchedulingTerm {
                            weight: 10,
                            match_expressions: vec![NodeSelectorRequirement {
                                key: "zone".into(),
                                operator: NodeSelectorOperator::In,
                                values: vec![zone.into()],
                            }],
                        }],
                    }),
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_row_per_matched_node() {
        let cluster = FakeCluster::new();
        cluster.add_node(zone_node("node-a", "us-east-1a")).await;
        cluster.add_node(zone_node("node-b", "us-east-1a")).await;
        cluster.add_node(zone_node("node-c", "us-east-1b")).await;

        let mapper = NodeAffinityMapper::new(cluster);
        let rows = mapper
            .project(&pod_preferring_zone("us-east-1a"))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].values[3], Cell::from(10_i32));
        assert_eq!(rows[0].values[4], Cell::from("node-a"));
        assert_eq!(rows[1].values[4], Cell::from("node-b"));
    }

    #[tokio::test]
    async fn failed_expression_lookup_keeps_remaining_expressions() {
        let cluster = FakeCluster::new();
        cluster.add_node(zone_node("node-a", "us-east-1a")).await;

        let mut pod = pod_preferring_zone("us-west-2a");
        pod.spec
            .affinity
            .as_mut()
            .unwrap()
            .node_affinity
            .as_mut()
            .unwrap()
            .preferred[0]
            .match_expressions
            .push(NodeSelectorRequirement {
                key: "zone".into(),
                operator: NodeSelectorOperator::In,
                values: vec!["us-east-1a".into()],
            });

        // The first expression's lookup fails; the second still projects.
        let mapper = NodeAffinityMapper::new(FirstNodeLookupFails::new(cluster));
        let rows = mapper.project(&pod).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[4], Cell::from("node-a"));
    }

    #[tokio::test]
    async fn pod_without_node_affinity_projects_zero_rows() {
        let mapper = NodeAffinityMapper::new(FakeCluster::new());
        let plain = Pod {
            meta: ObjectMeta {
                uid: "u2".into(),
                name: "plain".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let rows = mapper.project(&plain).await.unwrap();
        assert!(rows.is_empty());
    }
}
