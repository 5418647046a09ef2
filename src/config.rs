//! Environment-driven configuration.
//!
//! Every external collaborator is a placeholder endpoint: a URL plus an
//! optional bearer key. An endpoint without a URL is not configured, and
//! calling it fails like any other external call.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DEPLOYMENTS_URL: &str = "https://api.vercel.com/v1/deployments";
pub const DEFAULT_MONITORING_URL: &str = "https://grafana.joinecogrow.com";
pub const DEFAULT_ORCHESTRATION_DELAY: Duration = Duration::from_millis(1000);

/// One external HTTP collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn from_env(url_var: &str, key_var: &str, default_url: Option<&str>) -> Self {
        Self {
            url: env_var(url_var).or_else(|| default_url.map(str::to_string)),
            api_key: env_var(key_var),
        }
    }
}

/// Endpoints used by the master workflow pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegrationConfig {
    /// AI processing service (CrewAI).
    pub ai_processing: Endpoint,
    /// Workflow creation service (Stack AI).
    pub workflow: Endpoint,
    /// Deployment API (Vercel).
    pub deployment: Endpoint,
    /// Monitoring dashboard API (Grafana).
    pub monitoring: Endpoint,
}

impl IntegrationConfig {
    pub fn from_env() -> Self {
        Self {
            ai_processing: Endpoint::from_env("CREWAI_API_URL", "CREWAI_API_KEY", None),
            workflow: Endpoint::from_env("STACKAI_API_URL", "STACKAI_API_KEY", None),
            deployment: Endpoint::from_env(
                "VERCEL_DEPLOYMENTS_URL",
                "VERCEL_TOKEN",
                Some(DEFAULT_DEPLOYMENTS_URL),
            ),
            monitoring: Endpoint::from_env(
                "GRAFANA_URL",
                "GRAFANA_API_KEY",
                Some(DEFAULT_MONITORING_URL),
            ),
        }
    }

    /// No endpoint configured (for local development/testing).
    pub fn disabled() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Simulated duration of the orchestration stage.
    pub orchestration_delay: Duration,
}

impl PipelineSettings {
    pub fn from_env() -> Self {
        let orchestration_delay = env_var("ECOGROW_ORCHESTRATION_DELAY_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ORCHESTRATION_DELAY);

        Self {
            orchestration_delay,
        }
    }

    /// Settings with no simulated delay (for testing).
    pub fn immediate() -> Self {
        Self {
            orchestration_delay: Duration::ZERO,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            orchestration_delay: DEFAULT_ORCHESTRATION_DELAY,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    /// SQLite file. `None` uses the platform data directory.
    pub database_path: Option<PathBuf>,
    pub integrations: IntegrationConfig,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            database_path: env_var("ECOGROW_DATABASE_PATH").map(PathBuf::from),
            integrations: IntegrationConfig::from_env(),
            pipeline: PipelineSettings::from_env(),
        }
    }
}

/// Set and non-empty.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_has_no_urls() {
        let config = IntegrationConfig::disabled();
        assert!(config.ai_processing.url.is_none());
        assert!(config.deployment.url.is_none());
        assert!(config.monitoring.api_key.is_none());
    }

    #[test]
    fn endpoint_builder_sets_key() {
        let endpoint = Endpoint::new("http://localhost:9000").with_api_key("secret");
        assert_eq!(endpoint.url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(endpoint.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn endpoint_from_env_falls_back_to_default_url() {
        let endpoint = Endpoint::from_env(
            "ECOGROW_TEST_UNSET_URL",
            "ECOGROW_TEST_UNSET_KEY",
            Some(DEFAULT_MONITORING_URL),
        );
        assert_eq!(endpoint.url.as_deref(), Some(DEFAULT_MONITORING_URL));
        assert!(endpoint.api_key.is_none());
    }

    #[test]
    fn immediate_settings_skip_delay() {
        assert_eq!(PipelineSettings::immediate().orchestration_delay, Duration::ZERO);
        assert_eq!(
            PipelineSettings::default().orchestration_delay,
            DEFAULT_ORCHESTRATION_DELAY
        );
    }
}
