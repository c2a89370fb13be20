//! CLI runner - executes commands

use crate::catalog::{all_streams, Catalog, SelectedStream};
use crate::cli::commands::{Cli, Commands};
use crate::config::RecurlyConfig;
use crate::connector::{Connector, RecurlyConnector};
use crate::error::{Error, Result};
use crate::output::JsonLinesSink;
use crate::state::StateManager;
use serde_json::{json, Value};
use tracing::{info, warn};

/// CLI runner
#[derive(Debug)]
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover().await,
            Commands::Sync { streams } => self.sync(streams).await,
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<RecurlyConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return RecurlyConfig::from_json(json_str);
        }

        match &self.cli.config {
            Some(path) => RecurlyConfig::from_file(path),
            None => Err(Error::config(
                "Config not specified (use --config or --config-json)",
            )),
        }
    }

    /// Load state. Inline state takes precedence over the file's contents,
    /// but checkpoints still go to `--state` when it is given.
    fn load_state(&self) -> Result<StateManager> {
        match (&self.cli.state_json, &self.cli.state) {
            (Some(state_json), Some(path)) => {
                Ok(StateManager::from_json(state_json)?.with_path(path))
            }
            (Some(state_json), None) => StateManager::from_json(state_json),
            (None, Some(path)) => StateManager::from_file(path),
            (None, None) => Ok(StateManager::in_memory()),
        }
    }

    /// Streams chosen by the catalog, else by `--streams`, else all
    fn selected_streams(&self, names: &[String]) -> Result<Vec<SelectedStream>> {
        if let Some(path) = &self.cli.catalog {
            if !names.is_empty() {
                warn!("--streams is ignored when a catalog is given");
            }
            return Catalog::from_file(path)?.selected_streams();
        }

        if names.is_empty() {
            all_streams(None)
        } else {
            all_streams(Some(names))
        }
    }

    fn connector(&self) -> Result<RecurlyConnector> {
        Ok(RecurlyConnector::new(self.load_config()?))
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let result = self.connector()?.check().await?;

        let status = if result.success { "SUCCEEDED" } else { "FAILED" };
        let message = result
            .message
            .unwrap_or_else(|| "Connection successful".to_string());

        output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": status,
                "message": message
            }
        }));

        Ok(())
    }

    /// Discover streams
    async fn discover(&self) -> Result<()> {
        let catalog = self.connector()?.discover().await?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        Ok(())
    }

    /// Sync selected streams to stdout
    async fn sync(&self, names: &[String]) -> Result<()> {
        let connector = self.connector()?;
        let streams = self.selected_streams(names)?;
        let state = self.load_state()?;

        info!(
            "Syncing {} streams: {}",
            streams.len(),
            streams
                .iter()
                .map(|s| s.resource.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut sink = JsonLinesSink::stdout();
        let summary = connector.sync(&streams, state, &mut sink).await?;

        let failures = summary.failures();
        if failures.is_empty() {
            Ok(())
        } else {
            let names: Vec<&str> = failures.iter().map(|s| s.stream.as_str()).collect();
            Err(Error::Other(format!(
                "{} stream(s) failed: {}",
                names.len(),
                names.join(", ")
            )))
        }
    }
}

fn output_message(msg: &Value) {
    println!("{}", serde_json::to_string(msg).unwrap_or_default());
}
