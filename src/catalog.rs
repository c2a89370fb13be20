//! Catalog discovery and stream selection
//!
//! `discover` describes every registry stream with a permissive schema and
//! the standard metadata. A supplied catalog chooses streams through root
//! metadata `selected: true` and may override the replication method.

use crate::error::{Error, Result};
use crate::streams::{Resource, StreamDefinition};
use crate::types::{JsonObject, JsonValue, ReplicationMethod};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

/// A catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// One entry per stream
    pub streams: Vec<CatalogEntry>,
}

/// One stream in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// JSON schema
    #[serde(default)]
    pub schema: JsonValue,
    /// Replication key, informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    /// Replication method, informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_method: Option<String>,
    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Metadata attached to a breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream itself, `["properties", field]` for a field
    pub breadcrumb: Vec<String>,
    /// Key/value metadata
    pub metadata: JsonObject,
}

/// A stream chosen for a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedStream {
    /// Resource to extract
    pub resource: Resource,
    /// Method to use
    pub replication_method: ReplicationMethod,
}

impl SelectedStream {
    /// Select a resource with its default method
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            replication_method: resource.definition().replication_method,
        }
    }

    /// Override the replication method
    #[must_use]
    pub fn with_method(mut self, method: ReplicationMethod) -> Self {
        self.replication_method = method;
        self
    }

    /// Static descriptor of the resource
    pub fn definition(&self) -> &'static StreamDefinition {
        self.resource.definition()
    }
}

/// Permissive schema declaring the key fields of a stream
pub fn schema_for(def: &StreamDefinition) -> JsonValue {
    let mut properties = JsonObject::new();
    for key in def.primary_key {
        properties.insert((*key).to_string(), json!({"type": ["null", "string"]}));
    }
    properties.insert(
        def.replication_key.to_string(),
        json!({"type": ["null", "string"], "format": "date-time"}),
    );

    json!({
        "type": ["null", "object"],
        "additionalProperties": true,
        "properties": properties,
    })
}

fn metadata_for(def: &StreamDefinition) -> Vec<MetadataEntry> {
    let mut root = JsonObject::new();
    root.insert("table-key-properties".into(), json!(def.primary_key));
    root.insert(
        "forced-replication-method".into(),
        json!(def.replication_method.as_str()),
    );
    root.insert("valid-replication-keys".into(), json!([def.replication_key]));

    let mut entries = vec![MetadataEntry {
        breadcrumb: Vec::new(),
        metadata: root,
    }];

    let mut automatic: Vec<&str> = def.primary_key.to_vec();
    if !automatic.contains(&def.replication_key) {
        automatic.push(def.replication_key);
    }
    for field in automatic {
        let mut md = JsonObject::new();
        md.insert("inclusion".into(), json!("automatic"));
        entries.push(MetadataEntry {
            breadcrumb: vec!["properties".to_string(), field.to_string()],
            metadata: md,
        });
    }

    entries
}

impl Catalog {
    /// Describe every stream the connector supports
    pub fn discover() -> Self {
        let streams = Resource::ALL
            .iter()
            .map(|resource| {
                let def = resource.definition();
                CatalogEntry {
                    tap_stream_id: def.name.to_string(),
                    stream: def.name.to_string(),
                    key_properties: def.primary_key.iter().map(ToString::to_string).collect(),
                    schema: schema_for(def),
                    replication_key: Some(def.replication_key.to_string()),
                    replication_method: Some(def.replication_method.as_str().to_string()),
                    metadata: metadata_for(def),
                }
            })
            .collect();

        Self { streams }
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Streams marked selected, in catalog order.
    ///
    /// Every entry must name a known stream and every replication method
    /// must be recognised; either failure is a configuration error.
    pub fn selected_streams(&self) -> Result<Vec<SelectedStream>> {
        let mut selected = Vec::new();

        for entry in &self.streams {
            let resource: Resource = entry.tap_stream_id.parse()?;
            let root = entry.root_metadata();

            let method = match root
                .and_then(|md| md.get("replication-method"))
                .and_then(JsonValue::as_str)
                .or(entry.replication_method.as_deref())
            {
                Some(name) => name.parse::<ReplicationMethod>()?,
                None => resource.definition().replication_method,
            };

            let is_selected = root
                .and_then(|md| md.get("selected"))
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);

            if is_selected {
                selected.push(SelectedStream::new(resource).with_method(method));
            }
        }

        Ok(selected)
    }
}

impl CatalogEntry {
    /// Metadata for the empty breadcrumb
    pub fn root_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }
}

/// Every stream with its default method, optionally limited to `names`
pub fn all_streams(names: Option<&[String]>) -> Result<Vec<SelectedStream>> {
    match names {
        None => Ok(Resource::ALL.iter().copied().map(SelectedStream::new).collect()),
        Some(names) => names
            .iter()
            .map(|name| name.trim().parse::<Resource>().map(SelectedStream::new))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_discover_lists_every_stream() {
        let catalog = Catalog::discover();
        let names: Vec<&str> = catalog.streams.iter().map(|s| s.stream.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "accounts",
                "billing_info",
                "adjustments",
                "coupon_redemptions",
                "coupons",
                "invoices",
                "plans",
                "plans_add_ons",
                "subscriptions",
                "transactions"
            ]
        );
    }

    #[test]
    fn test_discover_metadata() {
        let catalog = Catalog::discover();
        let transactions = catalog
            .streams
            .iter()
            .find(|s| s.tap_stream_id == "transactions")
            .unwrap();

        let root = transactions.root_metadata().unwrap();
        assert_eq!(root["table-key-properties"], json!(["id"]));
        assert_eq!(root["forced-replication-method"], json!("INCREMENTAL"));
        assert_eq!(root["valid-replication-keys"], json!(["collected_at"]));

        let automatic: Vec<&str> = transactions
            .metadata
            .iter()
            .filter(|m| m.metadata.get("inclusion") == Some(&json!("automatic")))
            .map(|m| m.breadcrumb[1].as_str())
            .collect();
        assert_eq!(automatic, vec!["id", "collected_at"]);

        assert_eq!(
            transactions.schema["properties"]["collected_at"]["format"],
            "date-time"
        );
    }

    #[test]
    fn test_selected_streams() {
        let json = r#"{
            "streams": [
                {"tap_stream_id": "accounts", "stream": "accounts",
                 "metadata": [{"breadcrumb": [], "metadata": {"selected": true}}]},
                {"tap_stream_id": "plans", "stream": "plans",
                 "metadata": [{"breadcrumb": [], "metadata": {"selected": false}}]},
                {"tap_stream_id": "coupons", "stream": "coupons",
                 "metadata": [{"breadcrumb": [], "metadata": {"selected": true, "replication-method": "FULL_TABLE"}}]},
                {"tap_stream_id": "invoices", "stream": "invoices", "metadata": []}
            ]
        }"#;
        let selected = Catalog::from_json(json).unwrap().selected_streams().unwrap();

        assert_eq!(
            selected,
            vec![
                SelectedStream::new(Resource::Accounts),
                SelectedStream::new(Resource::Coupons).with_method(ReplicationMethod::FullTable),
            ]
        );
    }

    #[test]
    fn test_unknown_stream_is_fatal() {
        let json = r#"{"streams": [{"tap_stream_id": "refunds", "stream": "refunds"}]}"#;
        let err = Catalog::from_json(json)
            .unwrap()
            .selected_streams()
            .unwrap_err();

        assert!(matches!(err, Error::StreamNotFound { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_replication_method_is_fatal() {
        let json = r#"{"streams": [{"tap_stream_id": "plans", "stream": "plans",
            "metadata": [{"breadcrumb": [], "metadata": {"selected": true, "replication-method": "LOG_BASED"}}]}]}"#;
        let err = Catalog::from_json(json)
            .unwrap()
            .selected_streams()
            .unwrap_err();

        assert!(matches!(err, Error::Config { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_discovered_catalog_selects_nothing() {
        assert!(Catalog::discover().selected_streams().unwrap().is_empty());
    }

    #[test]
    fn test_all_streams_filter() {
        assert_eq!(all_streams(None).unwrap().len(), 10);

        let names = vec!["plans".to_string(), " transactions".to_string()];
        let selected = all_streams(Some(names.as_slice())).unwrap();
        assert_eq!(
            selected,
            vec![
                SelectedStream::new(Resource::Plans),
                SelectedStream::new(Resource::Transactions)
            ]
        );

        let names = vec!["nope".to_string()];
        assert!(all_streams(Some(&names)).is_err());
    }

    #[test]
    fn test_invalid_catalog_json() {
        assert!(matches!(
            Catalog::from_json("{"),
            Err(Error::Config { .. })
        ));
    }
}
