//! HTTP client for the external collaborators of the master workflow.
//!
//! None of these are real integrations: each is a configured URL and bearer
//! key. Every failure (unconfigured endpoint, transport error, non-success
//! status, undecodable body) surfaces as an [`IntegrationError`], which the
//! pipeline logs and swallows.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{Endpoint, IntegrationConfig};

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} endpoint is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },
}

/// Response of the AI processing service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiProcessingResponse {
    pub enhancements: Option<Value>,
    pub insights: Option<Value>,
}

/// Response of the workflow creation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkflowResponse {
    pub workflow_id: Option<String>,
    pub workflow: Option<Value>,
}

/// Response of the deployment API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentResponse {
    pub url: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IntegrationClient {
    config: IntegrationConfig,
    client: Client,
}

impl IntegrationClient {
    /// Uses the transport's default timeouts; outbound calls are not bounded
    /// any further.
    pub fn new(config: IntegrationConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Build a POST with optional bearer auth.
    fn post(
        &self,
        service: &'static str,
        endpoint: &Endpoint,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, IntegrationError> {
        let base = endpoint
            .url
            .as_deref()
            .ok_or(IntegrationError::NotConfigured(service))?;
        let url = format!("{}{}", base.trim_end_matches('/'), path);

        let mut req = self.client.post(url);
        if let Some(ref key) = endpoint.api_key {
            req = req.bearer_auth(key);
        }
        Ok(req)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        service: &'static str,
        response: reqwest::Response,
    ) -> Result<T, IntegrationError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(IntegrationError::Status {
                service,
                status,
                body,
            })
        }
    }

    /// Send the component to the AI processing service.
    pub async fn process_component(
        &self,
        component: &Value,
    ) -> Result<AiProcessingResponse, IntegrationError> {
        const SERVICE: &str = "AI processing";
        let response = self
            .post(SERVICE, &self.config.ai_processing, "/process")?
            .json(&json!({
                "component": component,
                "context": "JoinEcoGrow Platform",
                "features": ["sustainability", "growing", "community", "ai"],
            }))
            .send()
            .await?;
        self.handle_response(SERVICE, response).await
    }

    /// Create a full-stack workflow for the component.
    pub async fn create_workflow(
        &self,
        component: &Value,
    ) -> Result<WorkflowResponse, IntegrationError> {
        const SERVICE: &str = "Workflow";
        let response = self
            .post(SERVICE, &self.config.workflow, "/workflow")?
            .json(&json!({
                "component": component,
                "workflowType": "full-stack",
                "integrations": ["supabase", "vercel", "monitoring"],
            }))
            .send()
            .await?;
        self.handle_response(SERVICE, response).await
    }

    /// Deploy `code` as a single-page project.
    pub async fn deploy(
        &self,
        name: &str,
        code: &str,
    ) -> Result<DeploymentResponse, IntegrationError> {
        const SERVICE: &str = "Deployment";
        let response = self
            .post(SERVICE, &self.config.deployment, "")?
            .json(&json!({
                "name": name,
                "files": { "index.html": { "content": code } },
                "projectSettings": { "framework": "nextjs" },
            }))
            .send()
            .await?;
        self.handle_response(SERVICE, response).await
    }

    /// Register a performance dashboard for a component. The response body is
    /// ignored.
    pub async fn register_dashboard(
        &self,
        component_id: &str,
        component_name: &str,
    ) -> Result<(), IntegrationError> {
        const SERVICE: &str = "Monitoring";
        let response = self
            .post(SERVICE, &self.config.monitoring, "/api/dashboards/db")?
            .json(&json!({
                "dashboard": {
                    "title": format!("JoinEcoGrow Component: {component_name}"),
                    "panels": [{
                        "title": "Component Performance",
                        "type": "graph",
                        "targets": [{
                            "expr": format!(
                                "joinecogrow_component_performance{{component_id=\"{component_id}\"}}"
                            ),
                        }],
                    }],
                },
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(IntegrationError::Status {
                service: SERVICE,
                status,
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_endpoint_fails_without_network() {
        let client = IntegrationClient::new(IntegrationConfig::disabled());
        let err = client.process_component(&json!({})).await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured("AI processing")));
        assert_eq!(err.to_string(), "AI processing endpoint is not configured");
    }

    #[test]
    fn workflow_response_reads_camel_case() {
        let parsed: WorkflowResponse =
            serde_json::from_str(r#"{"workflowId":"wf-1","workflow":{"steps":3}}"#).unwrap();
        assert_eq!(parsed.workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(parsed.workflow, Some(json!({"steps": 3})));
    }

    #[test]
    fn responses_tolerate_missing_fields() {
        let parsed: DeploymentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.url.is_none());
        let parsed: AiProcessingResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.enhancements.is_none());
    }
}
