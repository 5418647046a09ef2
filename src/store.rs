//! The backing-store capability.
//!
//! Everything that reads or writes the `features` and `components` tables goes
//! through [`Store`], so handlers and the pipeline can run against the SQLite
//! [`Database`], the degraded [`UnavailableStore`], or a test double.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::db::Database;
use crate::models::*;

/// Backing-store failures. Callers surface the message and never retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

pub trait Store: Send + Sync {
    // Features

    /// Page of features ordered by recency, newest first, plus the total count.
    fn list_features(&self, page: u32, limit: u32) -> Result<FeaturePage, StoreError>;

    /// Active features in `category`, ordered by name.
    fn features_by_category(&self, category: FeatureCategory) -> Result<Vec<Feature>, StoreError>;

    /// Active features whose name or description contains `query`
    /// (case-insensitive), ordered by name.
    fn search_features(&self, query: &str) -> Result<Vec<Feature>, StoreError>;

    fn get_feature(&self, id: Uuid) -> Result<Option<Feature>, StoreError>;

    fn create_feature(&self, input: CreateFeatureInput) -> Result<Feature, StoreError>;

    fn update_feature(&self, id: Uuid, input: UpdateFeatureInput) -> Result<Feature, StoreError>;

    /// Clears `is_active`. Idempotent.
    fn soft_delete_feature(&self, id: Uuid) -> Result<Feature, StoreError>;

    fn feature_stats(&self) -> Result<FeatureStats, StoreError>;

    /// Features linked to a generated component, active or not.
    fn features_for_component(&self, component_id: Uuid) -> Result<Vec<Feature>, StoreError>;

    // Generated components

    fn create_component(&self, input: CreateComponentInput)
        -> Result<GeneratedComponent, StoreError>;

    fn get_component(&self, id: Uuid) -> Result<Option<GeneratedComponent>, StoreError>;

    fn set_refined_code(&self, id: Uuid, refined_code: &str)
        -> Result<GeneratedComponent, StoreError>;
}

/// Stand-in used when the database could not be opened at start-up.
///
/// Reads return empty results so pages keep rendering; writes fail with
/// [`StoreError::Unavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl Store for UnavailableStore {
    fn list_features(&self, _page: u32, _limit: u32) -> Result<FeaturePage, StoreError> {
        Ok(FeaturePage {
            data: Vec::new(),
            count: 0,
        })
    }

    fn features_by_category(&self, _category: FeatureCategory) -> Result<Vec<Feature>, StoreError> {
        Ok(Vec::new())
    }

    fn search_features(&self, _query: &str) -> Result<Vec<Feature>, StoreError> {
        Ok(Vec::new())
    }

    fn get_feature(&self, _id: Uuid) -> Result<Option<Feature>, StoreError> {
        Ok(None)
    }

    fn create_feature(&self, input: CreateFeatureInput) -> Result<Feature, StoreError> {
        input.validate()?;
        Err(self.unavailable())
    }

    fn update_feature(&self, _id: Uuid, _input: UpdateFeatureInput) -> Result<Feature, StoreError> {
        Err(self.unavailable())
    }

    fn soft_delete_feature(&self, _id: Uuid) -> Result<Feature, StoreError> {
        Err(self.unavailable())
    }

    fn feature_stats(&self) -> Result<FeatureStats, StoreError> {
        Ok(FeatureStats::default())
    }

    fn features_for_component(&self, _component_id: Uuid) -> Result<Vec<Feature>, StoreError> {
        Ok(Vec::new())
    }

    fn create_component(
        &self,
        _input: CreateComponentInput,
    ) -> Result<GeneratedComponent, StoreError> {
        Err(self.unavailable())
    }

    fn get_component(&self, _id: Uuid) -> Result<Option<GeneratedComponent>, StoreError> {
        Ok(None)
    }

    fn set_refined_code(
        &self,
        _id: Uuid,
        _refined_code: &str,
    ) -> Result<GeneratedComponent, StoreError> {
        Err(self.unavailable())
    }
}

/// Open and migrate the database, degrading to [`UnavailableStore`] on failure.
pub fn connect(path: Option<PathBuf>) -> Arc<dyn Store> {
    let opened = match path {
        Some(path) => Database::open(path),
        None => Database::open_default(),
    };

    match opened.and_then(|db| db.migrate().map(|_| db)) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            tracing::warn!("Backing store unreachable, serving empty results: {:#}", e);
            Arc::new(UnavailableStore::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_store_reads_are_empty() {
        let store = UnavailableStore::new("offline");
        assert!(store.list_features(1, 10).unwrap().data.is_empty());
        assert!(store.search_features("tree").unwrap().is_empty());
        assert_eq!(store.feature_stats().unwrap(), FeatureStats::default());
    }

    #[test]
    fn unavailable_store_writes_fail_after_validation() {
        let store = UnavailableStore::new("offline");

        let err = store.create_feature(CreateFeatureInput::default()).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = store
            .create_feature(CreateFeatureInput::new("A", FeatureCategory::Ai, "B"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn connect_falls_back_when_path_is_unusable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let store = connect(Some(blocker.join("ecogrow.db")));
        assert_eq!(store.feature_stats().unwrap(), FeatureStats::default());
        assert!(store
            .create_component(CreateComponentInput::generated("X", "code"))
            .is_err());
    }
}
