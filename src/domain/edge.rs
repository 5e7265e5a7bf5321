//! Edge domain model
//!
//! An edge links a set of source nodes to a set of target nodes. A plain
//! dependency has one of each; a hyperedge has several on either side.
//!
//! Graph files from older editors carry a scalar `source_id`/`target_id`
//! plus optional `source_ids`/`target_ids` lists. Both shapes are accepted on
//! read and collapsed into one endpoint set per side:
//!
//! Old format: `{"source_id": "a", "target_id": "c", "source_ids": ["a", "b"]}`
//! New format: `{"sources": ["a", "b"], "targets": ["c"]}`

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A graph edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEdge")]
pub struct Edge {
    /// Unique identifier within the graph
    pub id: String,

    /// Source endpoint ids (prerequisites)
    pub sources: BTreeSet<String>,

    /// Target endpoint ids (dependents)
    pub targets: BTreeSet<String>,

    /// Optional label
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Attributes this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Creates an edge between two endpoint sets
    pub fn new<S, T>(id: impl Into<String>, sources: S, targets: T) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            id: id.into(),
            sources: collect_ids(sources),
            targets: collect_ids(targets),
            text: String::new(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    /// Creates a plain one-to-one edge
    pub fn direct(id: impl Into<String>, source: &str, target: &str) -> Self {
        Self::new(id, [source], [target])
    }

    /// Returns true if the edge has exactly one source and one target
    pub fn is_direct(&self) -> bool {
        self.sources.len() == 1 && self.targets.len() == 1
    }

    /// Every (source, target) pair of the cross product, self-pairs excluded
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources.iter().flat_map(move |source| {
            self.targets
                .iter()
                .filter(move |target| *target != source)
                .map(move |target| (source.as_str(), target.as_str()))
        })
    }

    /// Removes the id from both sides; returns true if anything changed
    pub fn remove_endpoint(&mut self, node_id: &str) -> bool {
        let from_sources = self.sources.remove(node_id);
        let from_targets = self.targets.remove(node_id);
        from_sources || from_targets
    }

    /// Returns true if either side is empty
    pub fn is_dangling(&self) -> bool {
        self.sources.is_empty() || self.targets.is_empty()
    }
}

fn collect_ids<I>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    ids.into_iter()
        .map(Into::into)
        .filter(|id: &String| !id.is_empty())
        .collect()
}

/// Wire shape accepting both edge formats
#[derive(Deserialize)]
struct RawEdge {
    id: String,

    #[serde(default)]
    sources: Option<Value>,

    #[serde(default)]
    targets: Option<Value>,

    #[serde(default)]
    source_id: Option<Value>,

    #[serde(default)]
    target_id: Option<Value>,

    #[serde(default)]
    source_ids: Option<Value>,

    #[serde(default)]
    target_ids: Option<Value>,

    #[serde(default)]
    text: Option<Value>,

    #[serde(default)]
    metadata: Option<Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Collects one side's ids: the scalar if it is a string, plus the string
/// entries of each list. Lists given as anything but an array are ignored.
fn endpoint_ids(scalar: Option<Value>, lists: [Option<Value>; 2]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    if let Some(Value::String(id)) = scalar {
        ids.insert(id);
    }
    for list in lists {
        if let Some(Value::Array(items)) = list {
            ids.extend(items.into_iter().filter_map(|item| match item {
                Value::String(id) => Some(id),
                _ => None,
            }));
        }
    }
    ids.retain(|id| !id.is_empty());
    ids
}

impl From<RawEdge> for Edge {
    fn from(raw: RawEdge) -> Self {
        let text = match raw.text {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let metadata = match raw.metadata {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self {
            id: raw.id,
            sources: endpoint_ids(raw.source_id, [raw.sources, raw.source_ids]),
            targets: endpoint_ids(raw.target_id, [raw.targets, raw.target_ids]),
            text,
            metadata,
            extra: raw.extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn legacy_simple_edge() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source_id": "a",
            "target_id": "b"
        }))
        .unwrap();

        assert_eq!(edge.sources, ids(&["a"]));
        assert_eq!(edge.targets, ids(&["b"]));
        assert!(edge.is_direct());
    }

    #[test]
    fn legacy_hyperedge_unions_scalar_and_list() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source_id": "a",
            "target_id": "c",
            "source_ids": ["b", 7, null, "a"],
            "target_ids": ["d"]
        }))
        .unwrap();

        assert_eq!(edge.sources, ids(&["a", "b"]));
        assert_eq!(edge.targets, ids(&["c", "d"]));
        assert!(!edge.is_direct());
    }

    #[test]
    fn non_list_id_fields_ignored() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source_id": ["a"],
            "target_id": "c",
            "source_ids": ["b"],
            "target_ids": "d",
            "targets": "e"
        }))
        .unwrap();

        assert_eq!(edge.sources, ids(&["b"]));
        assert_eq!(edge.targets, ids(&["c"]));
    }

    #[test]
    fn empty_scalar_ignored() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source_id": "",
            "target_id": "c",
            "source_ids": ["a", "b"]
        }))
        .unwrap();

        assert_eq!(edge.sources, ids(&["a", "b"]));
    }

    #[test]
    fn normalized_format_round_trip() {
        let input = json!({
            "id": "e1",
            "sources": ["a", "b"],
            "targets": ["c"],
            "text": "feeds",
            "metadata": {"weight": 2},
            "style": "dashed"
        });
        let edge: Edge = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(edge.extra.get("style"), Some(&json!("dashed")));

        let output = serde_json::to_value(&edge).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn legacy_fields_not_written_back() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source_id": "a",
            "target_id": "b",
            "source_ids": ["a"],
            "target_ids": ["b"]
        }))
        .unwrap();

        let output = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            output,
            json!({"id": "e1", "sources": ["a"], "targets": ["b"]})
        );
    }

    #[test]
    fn pairs_skip_self() {
        let edge = Edge::new("e1", ["a", "b"], ["b", "c"]);
        let pairs: Vec<_> = edge.pairs().collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn self_loop_has_no_pairs() {
        let edge = Edge::direct("e1", "x", "x");
        assert_eq!(edge.pairs().count(), 0);
    }

    #[test]
    fn remove_endpoint() {
        let mut edge = Edge::new("e1", ["a", "b"], ["c"]);
        assert!(edge.remove_endpoint("a"));
        assert!(!edge.is_dangling());
        assert!(!edge.remove_endpoint("zzz"));
        assert!(edge.remove_endpoint("c"));
        assert!(edge.is_dangling());
    }
}
