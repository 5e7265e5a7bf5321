//! Node domain model
//!
//! A node is a typed record: id, label text, canvas position and a metadata
//! block. Anything else found in a graph file is kept in `extra` and written
//! back untouched, so payloads produced by other editors round-trip.
//!
//! Reads are lenient. A position that is not a number, a label that is not a
//! string or a metadata block that is not an object loads as "absent" rather
//! than failing the whole graph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Status a user can declare on a task node
///
/// This is user-set metadata. It is unrelated to the structural
/// ready/blocked classification computed by the dependency orderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredStatus {
    Started,
    InProgress,
    Blocked,
    Complete,
}

impl DeclaredStatus {
    /// All statuses in selector order (after "No Status")
    pub const ALL: [DeclaredStatus; 4] = [
        DeclaredStatus::Started,
        DeclaredStatus::InProgress,
        DeclaredStatus::Blocked,
        DeclaredStatus::Complete,
    ];

    /// Returns the stored tag (`in_progress`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredStatus::Started => "started",
            DeclaredStatus::InProgress => "in_progress",
            DeclaredStatus::Blocked => "blocked",
            DeclaredStatus::Complete => "complete",
        }
    }

    /// Returns a display label for the status selector
    pub fn label(&self) -> &'static str {
        match self {
            DeclaredStatus::Started => "Started",
            DeclaredStatus::InProgress => "In Progress",
            DeclaredStatus::Blocked => "Blocked",
            DeclaredStatus::Complete => "Complete",
        }
    }
}

impl fmt::Display for DeclaredStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a status tag outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status '{0}' (expected started, in_progress, blocked or complete)")]
pub struct UnknownStatus(pub String);

impl FromStr for DeclaredStatus {
    type Err = UnknownStatus;

    /// Tags match exactly, as they are stored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeclaredStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Node metadata
///
/// The known keys are kept as raw JSON values so that whatever a file
/// contains is preserved; the accessors interpret them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    /// Manual ordering hint, numeric when valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,

    /// Declared status tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,

    /// Every other metadata key
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeMeta {
    /// Returns true if no metadata is set
    pub fn is_empty(&self) -> bool {
        self.order.is_none()
            && self.status.is_none()
            && self.label.is_none()
            && self.name.is_none()
            && self.extra.is_empty()
    }

    /// Numeric ordering hint, if present and numeric
    pub fn order_hint(&self) -> Option<f64> {
        self.order.as_ref().and_then(Value::as_f64)
    }

    /// Declared status, if present and one of the known tags
    pub fn status(&self) -> Option<DeclaredStatus> {
        self.status
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// First non-blank `label` or `name` string, trimmed
    pub fn fallback_label(&self) -> Option<&str> {
        [&self.label, &self.name]
            .into_iter()
            .filter_map(|value| value.as_ref().and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// A graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within the graph
    pub id: String,

    /// Label text shown on the canvas
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: String,

    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub x: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub y: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub z: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_meta",
        skip_serializing_if = "NodeMeta::is_empty"
    )]
    pub metadata: NodeMeta,

    /// Attributes this crate does not interpret (colors, sizes, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Creates a node with the given id and label text
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            x: None,
            y: None,
            z: None,
            metadata: NodeMeta::default(),
            extra: Map::new(),
        }
    }

    /// Sets the position builder-style
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.set_position(x, y, None);
        self
    }

    /// Sets the canvas position, keeping `z` unless a new one is given
    pub fn set_position(&mut self, x: f64, y: f64, z: Option<f64>) {
        self.x = Some(x);
        self.y = Some(y);
        if z.is_some() {
            self.z = z;
        }
    }

    /// Label to show for this node
    ///
    /// Trimmed `text`, else `metadata.label` or `metadata.name`, else the id.
    pub fn display_label(&self) -> &str {
        let text = self.text.trim();
        if !text.is_empty() {
            return text;
        }
        self.metadata.fallback_label().unwrap_or(&self.id)
    }

    /// Declared status from `metadata.status`; unknown tags read as absent
    pub fn declared_status(&self) -> Option<DeclaredStatus> {
        self.metadata.status()
    }

    /// Sets or clears the declared status
    pub fn set_declared_status(&mut self, status: Option<DeclaredStatus>) {
        self.metadata.status = status.map(|s| Value::String(s.as_str().to_string()));
    }

    /// Sets or clears the ordering hint
    pub fn set_order_hint(&mut self, order: Option<f64>) {
        self.metadata.order = order.and_then(serde_json::Number::from_f64).map(Value::Number);
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

fn lenient_meta<'de, D>(deserializer: D) -> Result<NodeMeta, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(NodeMeta::default()),
    }
}
