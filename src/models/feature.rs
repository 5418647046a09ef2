use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A catalog entry describing a platform capability.
///
/// Features are never physically removed. Deleting one flips `is_active` to
/// false, which hides it from category and search listings while it still
/// counts towards the total in [`FeatureStats`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub category: FeatureCategory,
    pub description: String,
    /// Generated component that renders this feature, if any.
    pub component_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fixed set of catalog categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeatureCategory {
    Diy,
    Trees,
    Entertainment,
    Gaming,
    Ai,
    Iot,
    Blockchain,
    Community,
    Analytics,
    Commerce,
    Enterprise,
    Admin,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 12] = [
        Self::Diy,
        Self::Trees,
        Self::Entertainment,
        Self::Gaming,
        Self::Ai,
        Self::Iot,
        Self::Blockchain,
        Self::Community,
        Self::Analytics,
        Self::Commerce,
        Self::Enterprise,
        Self::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diy => "diy",
            Self::Trees => "trees",
            Self::Entertainment => "entertainment",
            Self::Gaming => "gaming",
            Self::Ai => "ai",
            Self::Iot => "iot",
            Self::Blockchain => "blockchain",
            Self::Community => "community",
            Self::Analytics => "analytics",
            Self::Commerce => "commerce",
            Self::Enterprise => "enterprise",
            Self::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Rejected feature input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: name, category, description")]
    MissingFields,

    #[error("Unknown feature category: {0}")]
    UnknownCategory(String),
}

/// Input for creating a new feature.
///
/// Fields arrive loosely typed from request bodies; [`CreateFeatureInput::validate`]
/// turns them into a [`NewFeature`] or a [`ValidationError`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateFeatureInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub component_id: Option<Uuid>,
    /// Defaults to `true` when omitted.
    pub is_active: Option<bool>,
}

impl CreateFeatureInput {
    pub fn new(
        name: impl Into<String>,
        category: FeatureCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            category: Some(category.as_str().to_string()),
            description: Some(description.into()),
            component_id: None,
            is_active: None,
        }
    }

    pub fn validate(self) -> Result<NewFeature, ValidationError> {
        let (Some(name), Some(category), Some(description)) = (
            non_blank(self.name),
            non_blank(self.category),
            non_blank(self.description),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        let category = FeatureCategory::from_str(&category)
            .ok_or(ValidationError::UnknownCategory(category))?;

        Ok(NewFeature {
            name,
            category,
            description,
            component_id: self.component_id,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A validated feature ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeature {
    pub name: String,
    pub category: FeatureCategory,
    pub description: String,
    pub component_id: Option<Uuid>,
    pub is_active: bool,
}

/// Input for updating an existing feature. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateFeatureInput {
    pub name: Option<String>,
    pub category: Option<FeatureCategory>,
    pub description: Option<String>,
    pub component_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

/// One page of the recency-ordered feature listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePage {
    pub data: Vec<Feature>,
    /// Total number of stored features, active or not.
    pub count: i64,
}

/// Aggregate catalog counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStats {
    pub total_features: i64,
    pub active_features: i64,
    /// Distinct categories among active features.
    pub categories: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_defaults_is_active_to_true() {
        let feature = CreateFeatureInput::new("Tree Tracker", FeatureCategory::Trees, "Track trees")
            .validate()
            .unwrap();
        assert!(feature.is_active);
        assert_eq!(feature.category, FeatureCategory::Trees);
    }

    #[test]
    fn validate_keeps_explicit_inactive_flag() {
        let mut input = CreateFeatureInput::new("Old", FeatureCategory::Diy, "Retired");
        input.is_active = Some(false);
        assert!(!input.validate().unwrap().is_active);
    }

    #[test]
    fn validate_rejects_missing_or_blank_fields() {
        let mut input = CreateFeatureInput::new("Name", FeatureCategory::Ai, "Desc");
        input.description = Some("   ".to_string());
        assert_eq!(input.validate(), Err(ValidationError::MissingFields));

        let input = CreateFeatureInput {
            name: Some("Name".to_string()),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::MissingFields));
    }

    #[test]
    fn validate_rejects_unknown_category() {
        let input = CreateFeatureInput {
            name: Some("Name".to_string()),
            category: Some("weather".to_string()),
            description: Some("Desc".to_string()),
            ..Default::default()
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::UnknownCategory("weather".to_string()))
        );
    }

    #[test]
    fn category_round_trips_through_its_name() {
        for category in FeatureCategory::ALL {
            assert_eq!(FeatureCategory::from_str(category.as_str()), Some(category));
        }
        assert_eq!(FeatureCategory::from_str("all"), None);
    }
}
