//! Generate, store and refine in one call.
//!
//! Backs the generation routes and the editor integration. Unlike the master
//! workflow in [`crate::pipeline`], a store failure here is an error, except
//! for [`IntegratedWorkflow::sync_component`] which persists best-effort.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::generator::{self, Framework, GenerateOptions, GenerationError, Styling};
use crate::models::{CreateComponentInput, GeneratedComponent};
use crate::refine::{self, RefinementContext};
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Component not found: {0}")]
    NotFound(Uuid),
}

/// Result of [`IntegratedWorkflow::generate_and_refine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    pub component: GeneratedComponent,
    pub refined: String,
}

/// A generated component as handed to an editor integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedComponent {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub framework: Framework,
    pub styling: Styling,
    pub types: String,
    /// Suggested location of the component source in the editor's project.
    pub file_path: String,
    pub types_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct IntegratedWorkflow {
    store: Arc<dyn Store>,
}

impl IntegratedWorkflow {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Generate a component and persist it.
    pub fn generate_component(&self, prompt: &str) -> Result<GeneratedComponent, WorkflowError> {
        let generated = generator::generate(prompt, &GenerateOptions::default())?;
        let component = self
            .store
            .create_component(CreateComponentInput::generated(generated.name, generated.code))?;
        tracing::info!(component_id = %component.id, "Generated component {}", component.name);
        Ok(component)
    }

    /// Refine a stored component against its linked features and persist the
    /// result.
    pub fn refine_with_data(&self, component_id: Uuid) -> Result<String, WorkflowError> {
        let component = self
            .store
            .get_component(component_id)?
            .ok_or(WorkflowError::NotFound(component_id))?;
        let features = self.store.features_for_component(component_id)?;

        let context = RefinementContext {
            features,
            db_schema: true,
        };
        let refined = refine::refine(&component.code, &context);
        self.store.set_refined_code(component_id, &refined)?;

        Ok(refined)
    }

    pub fn generate_and_refine(&self, prompt: &str) -> Result<WorkflowOutput, WorkflowError> {
        let component = self.generate_component(prompt)?;
        let refined = self.refine_with_data(component.id)?;

        // Deployment and monitoring only happen in the master workflow.
        tracing::debug!("Deploying component {} to Vercel", component.name);
        tracing::debug!("Tracking component {} in monitoring", component.name);

        Ok(WorkflowOutput { component, refined })
    }

    /// Generate with the caller's options and package the result for an
    /// editor. Storing is best-effort.
    pub fn sync_component(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<SyncedComponent, WorkflowError> {
        let generated = generator::generate(prompt, options)?;
        let name = generated.name;

        let now = Utc::now();
        let (id, created_at, updated_at) = match self
            .store
            .create_component(CreateComponentInput::generated(name.clone(), generated.code.clone()))
        {
            Ok(component) => (component.id, component.created_at, component.updated_at),
            Err(e) => {
                tracing::warn!("Could not store synced component {}: {}", name, e);
                (Uuid::new_v4(), now, now)
            }
        };

        Ok(SyncedComponent {
            id,
            types: generator::component_types(&name),
            file_path: format!("/components/generated/{name}.tsx"),
            types_path: format!("/types/generated/{name}.types.ts"),
            name,
            code: generated.code,
            description: prompt.trim().to_string(),
            category: "generated".to_string(),
            tags: generated.options.features,
            framework: generated.options.framework,
            styling: generated.options.styling,
            created_at,
            updated_at,
        })
    }
}
