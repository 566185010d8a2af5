use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::base::SourceObject;

/// Identity and bookkeeping shared by every cluster object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Returns the value of a label, or an empty string when absent.
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Resource amounts as the engine tracks them.
///
/// Memory and ephemeral storage are bytes, CPU is millicores. Absent amounts
/// are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub cpu_millis: i64,
    #[serde(default)]
    pub ephemeral_storage: i64,
}

/// Limits and requests of a single container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default)]
    pub limits: ResourceQuantities,
    #[serde(default)]
    pub requests: ResourceQuantities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub resources: ResourceRequirements,
}

/// Label-based object selector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

/// Operators a node selector requirement can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeSelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    Gt,
    Lt,
}

/// A single expression of a node selector term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSelectorRequirement {
    pub key: String,
    pub operator: NodeSelectorOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A weighted soft pod affinity term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPodAffinityTerm {
    pub weight: i32,
    #[serde(default)]
    pub label_selector: LabelSelector,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodAffinity {
    #[serde(default)]
    pub preferred: Vec<WeightedPodAffinityTerm>,
}

/// A weighted soft node affinity term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferredSchedulingTerm {
    pub weight: i32,
    #[serde(default)]
    pub match_expressions: Vec<NodeSelectorRequirement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAffinity {
    #[serde(default)]
    pub preferred: Vec<PreferredSchedulingTerm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Affinity {
    #[serde(default)]
    pub pod_affinity: Option<PodAffinity>,
    #[serde(default)]
    pub node_affinity: Option<NodeAffinity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub affinity: Option<Affinity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub pod_ip: String,
}

/// A pod as watched from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub meta: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
}

impl SourceObject for Pod {
    fn kind(&self) -> &'static str {
        "pod"
    }

    fn identity(&self) -> String {
        format!("{}/{}", self.meta.namespace, self.meta.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointAddress {
    #[serde(default)]
    pub hostname: String,
    pub ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointPort {
    #[serde(default)]
    pub name: String,
    pub port: i32,
}

/// One group of addresses that share a set of ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointSubset {
    #[serde(default)]
    pub addresses: Vec<EndpointAddress>,
    #[serde(default)]
    pub ports: Vec<EndpointPort>,
}

/// A service endpoints object as watched from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Endpoints {
    pub meta: ObjectMeta,
    #[serde(default)]
    pub subsets: Vec<EndpointSubset>,
}

impl SourceObject for Endpoints {
    fn kind(&self) -> &'static str {
        "endpoint"
    }

    fn identity(&self) -> String {
        format!("{}/{}", self.meta.namespace, self.meta.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub allocatable: ResourceQuantities,
    #[serde(default)]
    pub capacity: ResourceQuantities,
}

/// A node as watched from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub meta: ObjectMeta,
    #[serde(default)]
    pub status: NodeStatus,
}

impl SourceObject for Node {
    fn kind(&self) -> &'static str {
        "node"
    }

    fn identity(&self) -> String {
        self.meta.name.clone()
    }
}

/// Measured usage of one container inside a pod.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default)]
    pub usage: ResourceQuantities,
}

/// A pod usage sample from the metrics pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodMetrics {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Length of the measurement window in milliseconds.
    #[serde(default)]
    pub window_ms: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
}

impl SourceObject for PodMetrics {
    fn kind(&self) -> &'static str {
        "pod_metrics"
    }

    fn identity(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// A node usage sample from the metrics pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub name: String,
    /// Length of the measurement window in milliseconds.
    #[serde(default)]
    pub window_ms: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage: ResourceQuantities,
}

impl SourceObject for NodeMetrics {
    fn kind(&self) -> &'static str {
        "node_metrics"
    }

    fn identity(&self) -> String {
        self.name.clone()
    }
}
