//! Flow documents
//!
//! A flow is a saved visual-flow graph: metadata plus opaque node and edge
//! descriptors produced by the builder UI. The server never interprets the
//! graph contents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name given to flows saved without one
pub const DEFAULT_FLOW_NAME: &str = "Untitled Flow";

/// A stored flow document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRecord {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub nodes: Vec<Value>,
    pub edges: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial flow as submitted by a client.
///
/// Every field is optional; missing fields take their defaults when the
/// candidate becomes a [`FlowRecord`]. Unknown fields (including a client
/// supplied `updatedAt`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowCandidate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub nodes: Option<Vec<Value>>,
    #[serde(default)]
    pub edges: Option<Vec<Value>>,
    #[serde(default)]
    pub viewport: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token: the `updatedAt` the client last saw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl FlowCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn nodes(mut self, nodes: Vec<Value>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn edges(mut self, edges: Vec<Value>) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn expecting(mut self, updated_at: DateTime<Utc>) -> Self {
        self.expected_updated_at = Some(updated_at);
        self
    }

    /// The client supplied id, if any. Blank ids count as absent; any
    /// other id is used exactly as given.
    pub fn requested_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Materialize the candidate under `id` with the given timestamps.
    pub fn into_record(
        self,
        id: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> FlowRecord {
        FlowRecord {
            id,
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_FLOW_NAME.to_string()),
            is_active: self.is_active.unwrap_or(false),
            nodes: self.nodes.unwrap_or_default(),
            edges: self.edges.unwrap_or_default(),
            viewport: self.viewport.filter(|v| !v.is_null()),
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candidate_defaults() {
        let candidate: FlowCandidate = serde_json::from_value(json!({})).unwrap();
        let now = Utc::now();
        let record = candidate.into_record("f1".to_string(), now, now);

        assert_eq!(record.name, DEFAULT_FLOW_NAME);
        assert!(!record.is_active);
        assert!(record.nodes.is_empty());
        assert!(record.edges.is_empty());
        assert!(record.viewport.is_none());
    }

    #[test]
    fn test_candidate_accepts_camel_case_and_nulls() {
        let candidate: FlowCandidate = serde_json::from_value(json!({
            "id": "abc",
            "name": "Onboarding",
            "isActive": true,
            "nodes": [{"id": "n1", "type": "input"}],
            "edges": null,
            "viewport": {"x": 0, "y": 10, "zoom": 1.5},
            "updatedAt": "not even a date"
        }))
        .unwrap();

        assert_eq!(candidate.requested_id(), Some("abc"));
        assert_eq!(candidate.is_active, Some(true));
        assert!(candidate.edges.is_none());
        assert_eq!(candidate.nodes.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_blank_id_is_absent() {
        assert_eq!(FlowCandidate::new().with_id("   ").requested_id(), None);
        assert_eq!(FlowCandidate::new().requested_id(), None);
    }

    #[test]
    fn test_padded_id_is_kept_verbatim() {
        let candidate = FlowCandidate::new().with_id(" a1 ");
        assert_eq!(candidate.requested_id(), Some(" a1 "));
    }

    #[test]
    fn test_nodes_must_be_a_list() {
        let parsed = serde_json::from_value::<FlowCandidate>(json!({"nodes": "n1"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_record_wire_format() {
        let now = Utc::now();
        let record = FlowCandidate::new()
            .named("Wire")
            .into_record("w".to_string(), now, now);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["isActive"], json!(false));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("viewport").is_none());
    }
}
