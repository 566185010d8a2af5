use crate::source::resources::{
    LabelSelector, Node, NodeSelectorOperator, NodeSelectorRequirement, Pod,
};

/// Returns whether the pod's labels satisfy the selector.
///
/// An empty selector matches every pod.
pub fn pod_matches_selector(pod: &Pod, selector: &LabelSelector) -> bool {
    selector
        .match_labels
        .iter()
        .all(|(key, value)| pod.meta.labels.get(key) == Some(value))
}

/// Returns whether the node's labels satisfy the requirement.
///
/// `NotIn` and `DoesNotExist` match nodes that lack the key entirely. `Gt`
/// and `Lt` compare the label value and the first requirement value as
/// integers and never match when either side fails to parse.
pub fn node_matches_requirement(node: &Node, requirement: &NodeSelectorRequirement) -> bool {
    let label = node.meta.labels.get(&requirement.key);

    match requirement.operator {
        NodeSelectorOperator::In => {
            label.is_some_and(|value| requirement.values.iter().any(|v| v == value))
        }
        NodeSelectorOperator::NotIn => {
            label.is_none_or(|value| !requirement.values.iter().any(|v| v == value))
        }
        NodeSelectorOperator::Exists => label.is_some(),
        NodeSelectorOperator::DoesNotExist => label.is_none(),
        NodeSelectorOperator::Gt => compare_numeric(label, &requirement.values)
            .is_some_and(|(actual, bound)| actual > bound),
        NodeSelectorOperator::Lt => compare_numeric(label, &requirement.values)
            .is_some_and(|(actual, bound)| actual < bound),
    }
}

fn compare_numeric(label: Option<&String>, values: &[String]) -> Option<(i64, i64)> {
    let actual = label?.parse::<i64>().ok()?;
    let bound = values.first()?.parse::<i64>().ok()?;

    Some((actual, bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::resources::ObjectMeta;
    use std::collections::BTreeMap;

    fn labeled_pod(labels: &[(&str, &str)]) -> Pod {
        Pod {
            meta: ObjectMeta {
                name: "web-1".into(),
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn labeled_node(labels: &[(&str, &str)]) -> Node {
        Node {
            meta: ObjectMeta {
                name: "node-a".into(),
                labels: labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn requirement(
        key: &str,
        operator: NodeSelectorOperator,
        values: &[&str],
    ) -> NodeSelectorRequirement {
        NodeSelectorRequirement {
            key: key.to_string(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn empty_selector_matches_everything() {
        let pod = labeled_pod(&[("app", "web")]);
        assert!(pod_matches_selector(&pod, &LabelSelector::default()));
    }

    #[test]
    fn selector_requires_every_label() {
        let pod = labeled_pod(&[("app", "web"), ("tier", "frontend")]);

        let mut selector = LabelSelector::default();
        selector.match_labels.insert("app".into(), "web".into());
        assert!(pod_matches_selector(&pod, &selector));

        selector.match_labels.insert("tier".into(), "backend".into());
        assert!(!pod_matches_selector(&pod, &selector));
    }

    #[test]
    fn not_in_matches_absent_key() {
        let node = labeled_node(&[]);
        assert!(node_matches_requirement(
            &node,
            &requirement("zone", NodeSelectorOperator::NotIn, &["us-east-1a"])
        ));
        assert!(node_matches_requirement(
            &node,
            &requirement("zone", NodeSelectorOperator::DoesNotExist, &[])
        ));
    }

    #[test]
    fn in_and_exists_require_the_key() {
        let node = labeled_node(&[("zone", "us-east-1a")]);
        assert!(node_matches_requirement(
            &node,
            &requirement("zone", NodeSelectorOperator::In, &["us-east-1a", "us-east-1b"])
        ));
        assert!(node_matches_requirement(
            &node,
            &requirement("zone", NodeSelectorOperator::Exists, &[])
        ));
        assert!(!node_matches_requirement(
            &node,
            &requirement("region", NodeSelectorOperator::Exists, &[])
        ));
    }

    #[test]
    fn numeric_operators_never_match_unparsable_values() {
        let node = labeled_node(&[("cpus", "16")]);
        assert!(node_matches_requirement(
            &node,
            &requirement("cpus", NodeSelectorOperator::Gt, &["8"])
        ));
        assert!(!node_matches_requirement(
            &node,
            &requirement("cpus", NodeSelectorOperator::Lt, &["8"])
        ));
        assert!(!node_matches_requirement(
            &node,
            &requirement("cpus", NodeSelectorOperator::Gt, &["many"])
        ));

        let text_node = labeled_node(&[("cpus", "lots")]);
        assert!(!node_matches_requirement(
            &text_node,
            &requirement("cpus", NodeSelectorOperator::Gt, &["8"])
        ));
    }
}
