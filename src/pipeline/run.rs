use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::refine::Pass;

/// The record threaded through the pipeline.
///
/// Each stage receives the previous stage's record and returns a new one with
/// its own fields filled in. Fields of stages that failed stay `None` and are
/// left out of the JSON form, so a missing `deployedUrl` means the deployment
/// did not happen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    // Stage 1: generation
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub generated_at: DateTime<Utc>,
    pub source: String,

    // Stage 2: refinement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement_passes: Option<Vec<Pass>>,

    // Stage 3: storage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,

    // Stage 4: AI processing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_enhancements: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,

    // Stage 5: workflow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_created_at: Option<DateTime<Utc>>,

    // Stage 6: orchestration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestration_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestrated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestration_result: Option<OrchestrationResult>,

    // Stage 7: deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn generated(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
            generated_at: Utc::now(),
            source: "generator".to_string(),
            refined_code: None,
            refined_at: None,
            refinement_passes: None,
            stored_id: None,
            stored_at: None,
            ai_enhancements: None,
            ai_insights: None,
            processed_at: None,
            workflow_id: None,
            workflow: None,
            workflow_created_at: None,
            orchestration_id: None,
            orchestrated_at: None,
            orchestration_result: None,
            deployed_url: None,
            deployment_id: None,
            deployed_at: None,
        }
    }

    /// Refined code when refinement ran, otherwise the generated code.
    pub fn best_code(&self) -> &str {
        self.refined_code.as_deref().unwrap_or(&self.code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestrationResult {
    pub status: String,
    pub message: String,
}
