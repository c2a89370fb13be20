//! Connector trait
//!
//! The three operations a Singer-style source exposes, and the Recurly
//! implementation of them.

use crate::catalog::{Catalog, SelectedStream};
use crate::config::RecurlyConfig;
use crate::engine::{SyncEngine, SyncSummary};
use crate::error::Result;
use crate::http::FetchOutcome;
use crate::output::MessageSink;
use crate::state::StateManager;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Core trait for a source connector
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connector name
    fn name(&self) -> &str;

    /// Tests if credentials and configuration are valid
    async fn check(&self) -> Result<CheckResult>;

    /// Lists available streams
    async fn discover(&self) -> Result<Catalog>;

    /// Syncs `streams` in order, writing messages to `sink`
    async fn sync(
        &self,
        streams: &[SelectedStream],
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncSummary>;
}

// ============================================================================
// Recurly Connector
// ============================================================================

/// Recurly v2018 source
#[derive(Debug, Clone)]
pub struct RecurlyConnector {
    config: RecurlyConfig,
}

impl RecurlyConnector {
    /// Create a connector from a validated config
    pub fn new(config: RecurlyConfig) -> Self {
        Self { config }
    }

    /// Connector configuration
    pub fn config(&self) -> &RecurlyConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for RecurlyConnector {
    fn name(&self) -> &str {
        "recurly"
    }

    async fn check(&self) -> Result<CheckResult> {
        let client = self.config.resource_client()?;
        info!("Checking connection to site {}", client.site_id());

        let result = match client.first_account().await {
            Ok(FetchOutcome::Page { .. }) => CheckResult::success(),
            Ok(FetchOutcome::NotFound) => {
                CheckResult::failure(format!("Site {} not found", client.site_id()))
            }
            Ok(FetchOutcome::Failed { status, body }) => {
                CheckResult::failure(format!("HTTP {status}: {body}"))
            }
            Err(e) => CheckResult::failure(e.to_string()),
        };

        Ok(result)
    }

    async fn discover(&self) -> Result<Catalog> {
        Ok(Catalog::discover())
    }

    async fn sync(
        &self,
        streams: &[SelectedStream],
        state: StateManager,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncSummary> {
        let mut engine = SyncEngine::from_config(&self.config, state)?;
        engine.run(streams, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use crate::streams::Resource;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn connector_for(server: &MockServer) -> RecurlyConnector {
        RecurlyConnector::new(
            RecurlyConfig::new("2019-01-01T00:00:00Z", "acme", "key_abc")
                .with_base_url(server.uri()),
        )
    }

    #[test]
    fn test_check_result_success() {
        let result = CheckResult::success();
        assert!(result.success);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_check_result_failure() {
        let result = CheckResult::failure("Connection failed");
        assert!(!result.success);
        assert_eq!(result.message, Some("Connection failed".to_string()));
    }

    #[tokio::test]
    async fn test_check_requests_one_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/subdomain-acme/accounts"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "has_more": false,
                "next": null,
                "data": [{"id": "a1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = connector_for(&server).check().await.unwrap();
        assert_eq!(result, CheckResult::success());
    }

    #[tokio::test]
    async fn test_check_reports_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = connector_for(&server).check().await.unwrap();
        assert!(!result.success);
        assert!(result.message.unwrap().contains("Authentication"));
    }

    #[tokio::test]
    async fn test_check_reports_unknown_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = connector_for(&server).check().await.unwrap();
        assert_eq!(
            result.message.as_deref(),
            Some("Site subdomain-acme not found")
        );
    }

    #[tokio::test]
    async fn test_discover_lists_all_streams() {
        let server = MockServer::start().await;
        let catalog = connector_for(&server).discover().await.unwrap();
        assert_eq!(catalog.streams.len(), Resource::ALL.len());
    }

    #[tokio::test]
    async fn test_sync_through_trait_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/subdomain-acme/plans"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "has_more": false,
                "next": null,
                "data": [{"id": "p1", "updated_at": "2019-05-01T00:00:00Z"}]
            })))
            .mount(&server)
            .await;

        let connector: Box<dyn Connector> = Box::new(connector_for(&server));
        let mut sink = MemorySink::new();
        let summary = connector
            .sync(
                &[SelectedStream::new(Resource::Plans)],
                StateManager::in_memory(),
                &mut sink,
            )
            .await
            .unwrap();

        assert_eq!(connector.name(), "recurly");
        assert_eq!(summary.total_records(), 1);
        assert_eq!(sink.records("plans").len(), 1);
    }
}
