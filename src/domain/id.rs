//! Identifiers for graphs, nodes and edges
//!
//! ID Format:
//! - Graph IDs: user-chosen slugs (e.g., `workspace`, `release-plan`)
//! - Node IDs (generated): `n-{7-char-hash}` (e.g., `n-7f2b4c1`)
//! - Edge IDs (generated): `e-{7-char-hash}` (e.g., `e-9d3e5f2`)
//!
//! Node and edge ids read from a graph file are free-form strings. Only ids
//! minted by this crate follow the hashed format. The hash is derived from a
//! seed text plus the creation timestamp, so the same label created twice
//! gets two different ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid graph ID: expected letters, digits, '-' or '_', got '{0}'")]
    InvalidGraphId(String),
}

/// What a generated id names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Node,
    Edge,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            IdKind::Node => "n",
            IdKind::Edge => "e",
        }
    }
}

/// Generates a 7-character hash from seed text and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>, salt: u32) -> String {
    let input = format!(
        "{}{}{}",
        seed,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        salt
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

/// Generates an id like `n-7f2b4c1`
///
/// `salt` lets callers retry when the hash collides with an id that is
/// already taken in the same graph.
pub fn generate_id(kind: IdKind, seed: &str, timestamp: DateTime<Utc>, salt: u32) -> String {
    format!("{}-{}", kind.prefix(), generate_hash(seed, timestamp, salt))
}

/// Graph ID, a slug chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GraphId(String);

impl GraphId {
    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GraphId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(IdError::InvalidGraphId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for GraphId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GraphId> for String {
    fn from(id: GraphId) -> Self {
        id.0
    }
}
