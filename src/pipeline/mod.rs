//! The master workflow: a fixed eight-stage pipeline run strictly in sequence.
//!
//! 1. Generate UI            (fatal on failure)
//! 2. Refine
//! 3. Store                  (non-fatal)
//! 4. AI processing call     (non-fatal)
//! 5. Workflow call          (non-fatal)
//! 6. Orchestration          (simulated delay, always succeeds)
//! 7. Deployment call        (non-fatal)
//! 8. Monitoring call        (non-fatal, result discarded)
//!
//! A non-fatal failure is logged and the previous stage's record moves on
//! unchanged. No stage is retried, and runs share nothing but the store.

mod run;
mod stage;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use run::*;
pub use stage::*;

use crate::config::PipelineSettings;
use crate::generator::{self, GenerateOptions, GenerationError};
use crate::integrations::{IntegrationClient, IntegrationError};
use crate::models::CreateComponentInput;
use crate::refine::{self, RefinementContext};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Master workflow failed: {reason}")]
    Failed { stage: Stage, reason: String },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Failed { stage, .. } => *stage,
        }
    }
}

/// Body of an orchestration request. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineRequest {
    pub prompt: Option<String>,
    pub options: GenerateOptions,
}

impl PipelineRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            options: GenerateOptions::default(),
        }
    }
}

/// Why a tolerant stage did not contribute.
#[derive(Debug, Error)]
enum StageError {
    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The run could not be turned into a request payload.
    #[error("Failed to build request payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl StageError {
    fn is_unexpected(&self) -> bool {
        matches!(self, Self::Payload(_))
    }
}

pub struct Orchestrator {
    store: Arc<dyn Store>,
    integrations: IntegrationClient,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        integrations: IntegrationClient,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            integrations,
            settings,
        }
    }

    pub async fn execute(&self, request: &PipelineRequest) -> Result<PipelineReport, PipelineError> {
        tracing::info!("Starting master workflow orchestration for JoinEcoGrow platform");
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        log_step(Stage::Generate);
        let prompt = request.prompt.as_deref().unwrap_or_default();
        let run = match self.generate(prompt, &request.options) {
            Ok(run) => {
                stages.push(StageReport::new(Stage::Generate, StageStatus::Completed));
                run
            }
            Err(e) => {
                tracing::error!("Master workflow aborted at generation: {}", e);
                return Err(PipelineError::Failed {
                    stage: Stage::Generate,
                    reason: e.to_string(),
                });
            }
        };

        log_step(Stage::Refine);
        let run = self.refine(&run);
        stages.push(StageReport::new(Stage::Refine, StageStatus::Completed));

        log_step(Stage::Store);
        let stored = self.store_component(&run);
        let run = tolerate(Stage::Store, run, stored, &mut stages)?;

        log_step(Stage::AiProcessing);
        let processed = self.process_with_ai(&run).await;
        let run = tolerate(Stage::AiProcessing, run, processed, &mut stages)?;

        log_step(Stage::Workflow);
        let workflow = self.create_workflow(&run).await;
        let run = tolerate(Stage::Workflow, run, workflow, &mut stages)?;

        log_step(Stage::Orchestration);
        let run = self.orchestrate(&run).await;
        stages.push(StageReport::new(Stage::Orchestration, StageStatus::Completed));

        log_step(Stage::Deployment);
        let deployed = self.deploy(&run).await;
        let run = tolerate(Stage::Deployment, run, deployed, &mut stages)?;

        log_step(Stage::Monitoring);
        let monitored = self.register_monitoring(&run).await;
        tolerate(Stage::Monitoring, (), monitored, &mut stages)?;

        tracing::info!(run_id = %run.id, "Master workflow orchestration complete");
        Ok(PipelineReport { run, stages })
    }

    fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<PipelineRun, GenerationError> {
        let generated = generator::generate(prompt, options)?;
        Ok(PipelineRun::generated(generated.name, generated.code))
    }

    /// The run was minted in stage 1 and is not stored until stage 3, so no
    /// feature can be linked to it yet. The context carries no features.
    fn refine(&self, run: &PipelineRun) -> PipelineRun {
        let context = RefinementContext {
            features: Vec::new(),
            db_schema: true,
        };
        let refinement = refine::refine_with_report(&run.code, &context);

        PipelineRun {
            refined_code: Some(refinement.code),
            refined_at: Some(Utc::now()),
            refinement_passes: Some(refinement.changed),
            ..run.clone()
        }
    }

    fn store_component(&self, run: &PipelineRun) -> Result<PipelineRun, StageError> {
        let component = self.store.create_component(CreateComponentInput {
            name: run.name.clone(),
            code: run.code.clone(),
            refined_code: run.refined_code.clone(),
            created_by_generator: true,
            feature_id: None,
        })?;
        tracing::debug!(component_id = %component.id, "Component stored");

        Ok(PipelineRun {
            stored_id: Some(component.id),
            stored_at: Some(component.created_at),
            ..run.clone()
        })
    }

    async fn process_with_ai(&self, run: &PipelineRun) -> Result<PipelineRun, StageError> {
        let payload = serde_json::to_value(run)?;
        let response = self.integrations.process_component(&payload).await?;

        Ok(PipelineRun {
            ai_enhancements: response.enhancements,
            ai_insights: response.insights,
            processed_at: Some(Utc::now()),
            ..run.clone()
        })
    }

    async fn create_workflow(&self, run: &PipelineRun) -> Result<PipelineRun, StageError> {
        let payload = serde_json::to_value(run)?;
        let response = self.integrations.create_workflow(&payload).await?;

        Ok(PipelineRun {
            workflow_id: response.workflow_id,
            workflow: response.workflow,
            workflow_created_at: Some(Utc::now()),
            ..run.clone()
        })
    }

    /// Simulated: waits the configured delay and attaches a synthetic id.
    async fn orchestrate(&self, run: &PipelineRun) -> PipelineRun {
        tokio::time::sleep(self.settings.orchestration_delay).await;

        let suffix = run
            .workflow_id
            .clone()
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());

        PipelineRun {
            orchestration_id: Some(format!("temporal-{suffix}")),
            orchestrated_at: Some(Utc::now()),
            orchestration_result: Some(OrchestrationResult {
                status: "completed".to_string(),
                message: "Workflow orchestrated successfully".to_string(),
            }),
            ..run.clone()
        }
    }

    async fn deploy(&self, run: &PipelineRun) -> Result<PipelineRun, StageError> {
        let response = self
            .integrations
            .deploy(&format!("joinecogrow-{}", run.id), run.best_code())
            .await?;

        Ok(PipelineRun {
            deployed_url: response.url,
            deployment_id: response.id,
            deployed_at: Some(Utc::now()),
            ..run.clone()
        })
    }

    async fn register_monitoring(&self, run: &PipelineRun) -> Result<(), StageError> {
        self.integrations
            .register_dashboard(&run.id.to_string(), &run.name)
            .await?;
        tracing::info!("Monitoring dashboard created for {}", run.name);
        Ok(())
    }
}

fn log_step(stage: Stage) {
    tracing::info!("Step {}: {}", stage.step(), stage.label());
}

/// Record a tolerant stage's outcome. Ordinary failures hand `input` on
/// unchanged; unexpected ones abort the run.
fn tolerate<T>(
    stage: Stage,
    input: T,
    result: Result<T, StageError>,
    stages: &mut Vec<StageReport>,
) -> Result<T, PipelineError> {
    match result {
        Ok(next) => {
            stages.push(StageReport::new(stage, StageStatus::Completed));
            Ok(next)
        }
        Err(e) if e.is_unexpected() => {
            tracing::error!("{} failed unexpectedly: {}", stage.label(), e);
            stages.push(StageReport::new(
                stage,
                StageStatus::Fatal {
                    reason: e.to_string(),
                },
            ));
            Err(PipelineError::Failed {
                stage,
                reason: e.to_string(),
            })
        }
        Err(e) => {
            tracing::warn!("{} failed, continuing without it: {}", stage.label(), e);
            stages.push(StageReport::new(
                stage,
                StageStatus::Skipped {
                    reason: e.to_string(),
                },
            ));
            Ok(input)
        }
    }
}
