//! Configuration types for the labs
//!
//! Configuration is read once at startup into an immutable [`LabConfig`] and
//! handed to the runtime client, the registry and the orchestrator by
//! parameter.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LabError, Result};

/// Default MCP endpoint (a local streamable HTTP server)
pub const DEFAULT_MCP_SERVER_URL: &str = "http://127.0.0.1:8765/mcp";

/// Public Microsoft Learn MCP endpoint
pub const MSLEARN_MCP_SERVER_URL: &str = "https://learn.microsoft.com/api/mcp";

/// Default `api-version` sent to the hosted runtime
pub const DEFAULT_API_VERSION: &str = "v1";

/// Named remote agent variables, appended after `REMOTE_AGENT_URLS`
const NAMED_AGENT_URL_VARS: [&str; 2] = ["TITLE_AGENT_URL", "OUTLINE_AGENT_URL"];

/// Main configuration for the labs
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LabConfig {
    /// Hosted agent runtime connection
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Remote A2A agents
    #[serde(default)]
    pub remote_agents: RemoteAgentsConfig,

    /// MCP bridge settings
    #[serde(default)]
    pub mcp: McpConfig,

    /// Run polling policy
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Hosted agent runtime connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Project endpoint (`PROJECT_ENDPOINT`)
    #[serde(default)]
    pub endpoint: String,

    /// Model deployment name (`MODEL_DEPLOYMENT_NAME`)
    #[serde(default)]
    pub model: String,

    /// Bearer credential (`PROJECT_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API version query parameter
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: String::new(),
            api_key: None,
            api_version: default_api_version(),
        }
    }
}

/// Remote A2A agent endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteAgentsConfig {
    /// Base URLs, in resolution order
    #[serde(default)]
    pub urls: Vec<String>,

    /// Per-request timeout for discovery and invocation
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for RemoteAgentsConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// MCP bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Streamable HTTP endpoint of the MCP server
    #[serde(default = "default_mcp_server_url")]
    pub server_url: String,

    /// Label used for the bridge agent and log lines
    #[serde(default = "default_mcp_label")]
    pub label: String,
}

fn default_mcp_server_url() -> String {
    DEFAULT_MCP_SERVER_URL.to_string()
}

fn default_mcp_label() -> String {
    "mcp-bridge".to_string()
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_url: default_mcp_server_url(),
            label: default_mcp_label(),
        }
    }
}

/// Run polling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed delay between run status polls
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub interval: Duration,

    /// Upper bound on polls per run (unbounded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<usize>,
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_polls: None,
        }
    }
}

impl LabConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (agentlab.toml, then AGENTLAB_CONFIG_PATH if set)
    /// 3. `AGENTLAB_` prefixed variables (`__` separates sections)
    /// 4. The platform variables (`PROJECT_ENDPOINT`, `REMOTE_AGENT_URLS`, ...)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is invalid or the endpoint or model is missing.
    pub fn load() -> Result<Self> {
        let config = Self::load_unvalidated(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Same layering as [`LabConfig::load`] without validation, with an
    /// optional extra file merged after `AGENTLAB_CONFIG_PATH`.
    ///
    /// Commands that only talk to remote agents use this, since they do not
    /// need a runtime endpoint.
    pub fn load_unvalidated(path: Option<&std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(LabConfig::default()))
            .merge(Toml::file("agentlab.toml"));

        if let Ok(path) = std::env::var("AGENTLAB_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        let mut config: LabConfig = figment
            .merge(Env::prefixed("AGENTLAB_").split("__"))
            .extract()
            .map_err(|e| LabError::Configuration(format!("Failed to load configuration: {}", e)))?;

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply the platform
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or validation fails.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let mut config: LabConfig = Figment::from(Serialized::defaults(LabConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .extract()
            .map_err(|e| {
                LabError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from defaults plus a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LabConfig::default();
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply the platform variables on top of file/prefixed configuration.
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(endpoint) = non_empty("PROJECT_ENDPOINT") {
            self.runtime.endpoint = endpoint;
        }
        if let Some(model) = non_empty("MODEL_DEPLOYMENT_NAME") {
            self.runtime.model = model;
        }
        if let Some(key) = non_empty("PROJECT_API_KEY") {
            self.runtime.api_key = Some(key);
        }
        if let Some(version) = non_empty("PROJECT_API_VERSION") {
            self.runtime.api_version = version;
        }
        if let Some(url) = non_empty("MCP_SERVER_URL") {
            self.mcp.server_url = url;
        }

        let csv = non_empty("REMOTE_AGENT_URLS");
        let named: Vec<Option<String>> = NAMED_AGENT_URL_VARS
            .iter()
            .map(|key| non_empty(*key))
            .collect();
        if csv.is_some() || named.iter().any(Option::is_some) {
            let mut urls = std::mem::take(&mut self.remote_agents.urls);
            urls.extend(collect_remote_urls(csv.as_deref(), &named));
            self.remote_agents.urls = dedup_preserving_order(urls);
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint or model deployment is missing.
    pub fn validate(&self) -> Result<()> {
        if self.runtime.endpoint.trim().is_empty() || self.runtime.model.trim().is_empty() {
            return Err(LabError::Configuration(
                "Env vars PROJECT_ENDPOINT and MODEL_DEPLOYMENT_NAME are required.".to_string(),
            ));
        }
        if self.polling.max_polls == Some(0) {
            return Err(LabError::Configuration(
                "polling.max_polls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Combine a CSV list with individually named URLs.
///
/// Entries are trimmed, empty entries dropped and duplicates removed while
/// keeping the first occurrence.
pub fn collect_remote_urls(csv: Option<&str>, named: &[Option<String>]) -> Vec<String> {
    let mut urls: Vec<String> = csv
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect();

    urls.extend(
        named
            .iter()
            .flatten()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
    );

    dedup_preserving_order(urls)
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter()
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_endpoint_is_configuration_error() {
        let result = LabConfig::from_lookup(lookup(&[("MODEL_DEPLOYMENT_NAME", "gpt-4o")]));
        assert!(matches!(result, Err(LabError::Configuration(_))));
    }

    #[test]
    fn test_required_values_and_defaults() {
        let config = LabConfig::from_lookup(lookup(&[
            ("PROJECT_ENDPOINT", "https://example.services.ai.azure.com/api/projects/lab"),
            ("MODEL_DEPLOYMENT_NAME", "gpt-4o"),
        ]))
        .unwrap();

        assert_eq!(config.runtime.model, "gpt-4o");
        assert_eq!(config.runtime.api_version, DEFAULT_API_VERSION);
        assert!(config.runtime.api_key.is_none());
        assert!(config.remote_agents.urls.is_empty());
        assert_eq!(config.mcp.server_url, DEFAULT_MCP_SERVER_URL);
        assert_eq!(config.polling.interval, Duration::from_millis(500));
        assert_eq!(config.polling.max_polls, None);
    }

    #[test]
    fn test_remote_urls_csv_then_named() {
        let config = LabConfig::from_lookup(lookup(&[
            ("PROJECT_ENDPOINT", "http://runtime"),
            ("MODEL_DEPLOYMENT_NAME", "gpt-4o"),
            ("REMOTE_AGENT_URLS", " http://localhost:8001 , ,http://localhost:8002"),
            ("OUTLINE_AGENT_URL", "http://localhost:8002"),
            ("TITLE_AGENT_URL", "http://localhost:9001"),
        ]))
        .unwrap();

        assert_eq!(
            config.remote_agents.urls,
            vec![
                "http://localhost:8001".to_string(),
                "http://localhost:8002".to_string(),
                "http://localhost:9001".to_string(),
            ]
        );
    }

    #[test]
    fn test_collect_remote_urls_empty() {
        assert!(collect_remote_urls(None, &[None, None]).is_empty());
        assert!(collect_remote_urls(Some(" , "), &[Some("  ".to_string())]).is_empty());
    }

    #[test]
    fn test_from_file_merges_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentlab.toml");
        std::fs::write(
            &path,
            r#"
[runtime]
endpoint = "http://runtime.local"
model = "gpt-4o-mini"

[remote_agents]
urls = ["http://localhost:8001"]
request_timeout = "5s"

[polling]
interval = "250ms"
max_polls = 40
"#,
        )
        .unwrap();

        let config = LabConfig::from_file(&path).unwrap();
        assert_eq!(config.runtime.endpoint, "http://runtime.local");
        assert_eq!(config.remote_agents.request_timeout, Duration::from_secs(5));
        assert_eq!(config.polling.interval, Duration::from_millis(250));
        assert_eq!(config.polling.max_polls, Some(40));
    }

    #[test]
    fn test_zero_poll_budget_rejected() {
        let mut config = LabConfig::default();
        config.runtime.endpoint = "http://runtime".to_string();
        config.runtime.model = "gpt-4o".to_string();
        config.polling.max_polls = Some(0);
        assert!(config.validate().is_err());
    }
}
