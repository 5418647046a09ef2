mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::*;
use crate::store::{Store, StoreError};

const FEATURE_COLUMNS: &str =
    "id, name, category, description, component_id, is_active, created_at, updated_at";

const COMPONENT_COLUMNS: &str =
    "id, name, code, refined_code, created_by_generator, feature_id, created_at, updated_at";

/// Largest page the feature listing will return.
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "joinecogrow", "joinecogrow")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("joinecogrow.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        schema::run_migrations(&conn)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn query_features<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Feature>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let features = stmt
            .query_map(params, feature_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(features)
    }
}

impl Store for Database {
    // ============================================================
    // Feature operations
    // ============================================================

    fn list_features(&self, page: u32, limit: u32) -> Result<FeaturePage, StoreError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);

        let data = self.query_features(
            &format!(
                "SELECT {FEATURE_COLUMNS} FROM features
                 ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
            ),
            (i64::from(limit), offset),
        )?;

        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM features", [], |row| row.get(0))?;

        Ok(FeaturePage { data, count })
    }

    fn features_by_category(&self, category: FeatureCategory) -> Result<Vec<Feature>, StoreError> {
        self.query_features(
            &format!(
                "SELECT {FEATURE_COLUMNS} FROM features
                 WHERE category = ? AND is_active = 1
                 ORDER BY name COLLATE NOCASE, name"
            ),
            [category.as_str()],
        )
    }

    fn search_features(&self, query: &str) -> Result<Vec<Feature>, StoreError> {
        // SQLite's LIKE and lower() only fold ASCII, so matching happens here.
        let needle = query.to_lowercase();
        let mut features: Vec<Feature> = self
            .query_features(
                &format!("SELECT {FEATURE_COLUMNS} FROM features WHERE is_active = 1"),
                [],
            )?
            .into_iter()
            .filter(|f| {
                f.name.to_lowercase().contains(&needle)
                    || f.description.to_lowercase().contains(&needle)
            })
            .collect();

        features.sort_by_cached_key(|f| (f.name.to_lowercase(), f.name.clone()));
        Ok(features)
    }

    fn get_feature(&self, id: Uuid) -> Result<Option<Feature>, StoreError> {
        let conn = self.conn()?;
        let feature = conn
            .query_row(
                &format!("SELECT {FEATURE_COLUMNS} FROM features WHERE id = ?"),
                [id.to_string()],
                feature_from_row,
            )
            .optional()?;
        Ok(feature)
    }

    fn create_feature(&self, input: CreateFeatureInput) -> Result<Feature, StoreError> {
        let input = input.validate()?;

        let conn = self.conn()?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO features (id, name, category, description, component_id, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                input.category.as_str(),
                &input.description,
                input.component_id.map(|u| u.to_string()),
                input.is_active,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Feature {
            id,
            name: input.name,
            category: input.category,
            description: input.description,
            component_id: input.component_id,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_feature(&self, id: Uuid, input: UpdateFeatureInput) -> Result<Feature, StoreError> {
        let existing = self.get_feature(id)?.ok_or(StoreError::NotFound {
            entity: "Feature",
            id,
        })?;

        if [&input.name, &input.description]
            .into_iter()
            .flatten()
            .any(|v| v.trim().is_empty())
        {
            return Err(ValidationError::MissingFields.into());
        }

        let conn = self.conn()?;
        let now = Utc::now();
        let name = input.name.unwrap_or(existing.name);
        let category = input.category.unwrap_or(existing.category);
        let description = input.description.unwrap_or(existing.description);
        let component_id = input.component_id.or(existing.component_id);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        conn.execute(
            "UPDATE features SET name = ?, category = ?, description = ?, component_id = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
            (
                &name,
                category.as_str(),
                &description,
                component_id.map(|u| u.to_string()),
                is_active,
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Feature {
            id,
            name,
            category,
            description,
            component_id,
            is_active,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    fn soft_delete_feature(&self, id: Uuid) -> Result<Feature, StoreError> {
        {
            let conn = self.conn()?;
            let rows = conn.execute(
                "UPDATE features SET is_active = 0, updated_at = ? WHERE id = ?",
                (Utc::now().to_rfc3339(), id.to_string()),
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound {
                    entity: "Feature",
                    id,
                });
            }
        }

        self.get_feature(id)?.ok_or(StoreError::NotFound {
            entity: "Feature",
            id,
        })
    }

    fn feature_stats(&self) -> Result<FeatureStats, StoreError> {
        let conn = self.conn()?;
        let stats = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(is_active), 0),
                    COUNT(DISTINCT CASE WHEN is_active = 1 THEN category END)
             FROM features",
            [],
            |row| {
                Ok(FeatureStats {
                    total_features: row.get(0)?,
                    active_features: row.get(1)?,
                    categories: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    fn features_for_component(&self, component_id: Uuid) -> Result<Vec<Feature>, StoreError> {
        self.query_features(
            &format!(
                "SELECT {FEATURE_COLUMNS} FROM features
                 WHERE component_id = ? ORDER BY name COLLATE NOCASE, name"
            ),
            [component_id.to_string()],
        )
    }

    // ============================================================
    // Generated component operations
    // ============================================================

    fn create_component(
        &self,
        input: CreateComponentInput,
    ) -> Result<GeneratedComponent, StoreError> {
        let conn = self.conn()?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO components (id, name, code, refined_code, created_by_generator, feature_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.code,
                &input.refined_code,
                input.created_by_generator,
                input.feature_id.map(|u| u.to_string()),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(GeneratedComponent {
            id,
            name: input.name,
            code: input.code,
            refined_code: input.refined_code,
            created_by_generator: input.created_by_generator,
            feature_id: input.feature_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_component(&self, id: Uuid) -> Result<Option<GeneratedComponent>, StoreError> {
        let conn = self.conn()?;
        let component = conn
            .query_row(
                &format!("SELECT {COMPONENT_COLUMNS} FROM components WHERE id = ?"),
                [id.to_string()],
                component_from_row,
            )
            .optional()?;
        Ok(component)
    }

    fn set_refined_code(
        &self,
        id: Uuid,
        refined_code: &str,
    ) -> Result<GeneratedComponent, StoreError> {
        {
            let conn = self.conn()?;
            let rows = conn.execute(
                "UPDATE components SET refined_code = ?, updated_at = ? WHERE id = ?",
                (refined_code, Utc::now().to_rfc3339(), id.to_string()),
            )?;
            if rows == 0 {
                return Err(StoreError::NotFound {
                    entity: "Component",
                    id,
                });
            }
        }

        self.get_component(id)?.ok_or(StoreError::NotFound {
            entity: "Component",
            id,
        })
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn feature_from_row(row: &Row<'_>) -> rusqlite::Result<Feature> {
    let category: String = row.get(2)?;
    let category = FeatureCategory::from_str(&category).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown feature category: {category}").into(),
        )
    })?;

    Ok(Feature {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        category,
        description: row.get(3)?,
        component_id: row.get::<_, Option<String>>(4)?.map(parse_uuid),
        is_active: row.get(5)?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn component_from_row(row: &Row<'_>) -> rusqlite::Result<GeneratedComponent> {
    Ok(GeneratedComponent {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        code: row.get(2)?,
        refined_code: row.get(3)?,
        created_by_generator: row.get(4)?,
        feature_id: row.get::<_, Option<String>>(5)?.map(parse_uuid),
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
