use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A code artifact produced by the component generator.
///
/// Created once per generation and optionally updated once with refined
/// code. The system never deletes components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedComponent {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub refined_code: Option<String>,
    /// Provenance flag: true when the generator produced the code.
    pub created_by_generator: bool,
    pub feature_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for persisting a generated component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComponentInput {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub refined_code: Option<String>,
    #[serde(default = "default_created_by_generator")]
    pub created_by_generator: bool,
    #[serde(default)]
    pub feature_id: Option<Uuid>,
}

impl CreateComponentInput {
    /// A generator-created component with no refined code yet.
    pub fn generated(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            refined_code: None,
            created_by_generator: true,
            feature_id: None,
        }
    }
}

fn default_created_by_generator() -> bool {
    true
}
