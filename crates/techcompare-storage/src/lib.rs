use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use techcompare_core::{clamp_base_weight, Criterion, CriterionType, Technology, MAX_BASE_WEIGHT};
use thiserror::Error;
use tracing::{debug, info};

const TECH_ID_PREFIX: &str = "tech-";
const CRITERION_ID_PREFIX: &str = "crit-";
const DEFAULT_CATEGORY: &str = "other";

/// Insert-or-update payload for a technology. Without an id the record is
/// matched by name, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct NewTechnology {
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub metrics: BTreeMap<String, f64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewCriterion {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub weight: f64,
    pub kind: CriterionType,
    pub active: bool,
}

pub trait CatalogBackend: Send + Sync {
    /// Records whose id is in `ids`, in catalog order. Unknown ids are skipped.
    fn find_technologies_by_ids(&self, ids: &[String]) -> Result<Vec<Technology>, StorageError>;
    /// Records whose name matches one of `names` ignoring case, in catalog order.
    fn find_technologies_by_names(&self, names: &[String])
        -> Result<Vec<Technology>, StorageError>;
    fn get_active_criteria(&self) -> Result<Vec<Criterion>, StorageError>;
    fn list_technologies(&self, limit: usize) -> Vec<Technology>;
    fn list_criteria(&self) -> Vec<Criterion>;
    fn upsert_technology(&mut self, new_tech: NewTechnology) -> Result<Technology, StorageError>;
    fn delete_technology(&mut self, id: &str) -> Result<bool, StorageError>;
    fn upsert_criterion(&mut self, new_criterion: NewCriterion)
        -> Result<Criterion, StorageError>;
    fn delete_criterion(&mut self, id: &str) -> Result<bool, StorageError>;
    fn stats(&self) -> serde_json::Value;
}

/// Catalog handle shared between the orchestrator and the tool server.
pub type SharedCatalog = Arc<RwLock<Box<dyn CatalogBackend>>>;

pub fn shared(backend: impl CatalogBackend + 'static) -> SharedCatalog {
    Arc::new(RwLock::new(Box::new(backend)))
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    technologies: Vec<Technology>,
    #[serde(default)]
    criteria: Vec<Criterion>,
}

#[derive(Serialize)]
struct PersistedView<'a> {
    technologies: &'a [Technology],
    criteria: &'a [Criterion],
}

pub struct PersistentCatalogStore {
    path: PathBuf,
    technologies: Vec<Technology>,
    criteria: Vec<Criterion>,
    next_tech_id: u64,
    next_criterion_id: u64,
}

fn next_seq<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

impl PersistentCatalogStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let bytes = serde_json::to_vec_pretty(&Persisted::default())?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let persisted: Persisted = serde_json::from_slice(&bytes)?;
        let next_tech_id = next_seq(
            persisted.technologies.iter().map(|t| t.id.as_str()),
            TECH_ID_PREFIX,
        );
        let next_criterion_id = next_seq(
            persisted.criteria.iter().map(|c| c.id.as_str()),
            CRITERION_ID_PREFIX,
        );
        info!(
            path = %path.display(),
            technologies = persisted.technologies.len(),
            criteria = persisted.criteria.len(),
            "opened catalog"
        );

        Ok(Self {
            path,
            technologies: persisted.technologies,
            criteria: persisted.criteria,
            next_tech_id,
            next_criterion_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn find_technologies_by_ids(&self, ids: &[String]) -> Vec<Technology> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.technologies
            .iter()
            .filter(|t| wanted.contains(t.id.as_str()))
            .cloned()
            .collect()
    }

    pub fn find_technologies_by_names(&self, names: &[String]) -> Vec<Technology> {
        let wanted: HashSet<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        self.technologies
            .iter()
            .filter(|t| wanted.contains(&t.name.to_lowercase()))
            .cloned()
            .collect()
    }

    pub fn get_active_criteria(&self) -> Vec<Criterion> {
        self.criteria.iter().filter(|c| c.active).cloned().collect()
    }

    /// Most recently added first.
    pub fn list_technologies(&self, limit: usize) -> Vec<Technology> {
        let n = limit.max(1);
        self.technologies.iter().rev().take(n).cloned().collect()
    }

    pub fn list_criteria(&self) -> Vec<Criterion> {
        self.criteria.clone()
    }

    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "technologies": self.technologies.len(),
            "criteria": self.criteria.len(),
            "activeCriteria": self.criteria.iter().filter(|c| c.active).count(),
            "path": self.path,
        })
    }

    pub fn upsert_technology(
        &mut self,
        new_tech: NewTechnology,
    ) -> Result<Technology, StorageError> {
        let name = new_tech.name.trim().to_string();
        if name.is_empty() {
            return Err(StorageError::InvalidInput(
                "technology name cannot be empty".to_string(),
            ));
        }
        if let Some((key, _)) = new_tech.metrics.iter().find(|(_, v)| !v.is_finite()) {
            return Err(StorageError::InvalidInput(format!(
                "metric '{key}' must be a finite number"
            )));
        }

        let lowered = name.to_lowercase();
        let by_name = self
            .technologies
            .iter()
            .position(|t| t.name.to_lowercase() == lowered);
        let slot = match new_tech.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                let pos = self
                    .technologies
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or_else(|| StorageError::NotFound(format!("technology {id}")))?;
                if by_name.is_some_and(|other| other != pos) {
                    return Err(StorageError::InvalidInput(format!(
                        "another technology is already named '{name}'"
                    )));
                }
                Some(pos)
            }
            _ => by_name,
        };

        let category = match new_tech.category.trim() {
            "" => DEFAULT_CATEGORY.to_string(),
            other => other.to_string(),
        };
        let tags = new_tech
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        let mut technologies = self.technologies.clone();
        let record = if let Some(pos) = slot {
            let existing = technologies
                .get_mut(pos)
                .ok_or_else(|| StorageError::NotFound(format!("technology #{pos}")))?;
            existing.name = name;
            existing.category = category;
            existing.metrics = new_tech.metrics;
            existing.tags = tags;
            existing.clone()
        } else {
            let record = Technology {
                id: format!("{TECH_ID_PREFIX}{}", self.next_tech_id),
                name,
                category,
                metrics: new_tech.metrics,
                tags,
            };
            technologies.push(record.clone());
            record
        };

        self.write_document(&technologies, &self.criteria)?;
        self.technologies = technologies;
        if slot.is_none() {
            self.next_tech_id += 1;
        }
        debug!(id = %record.id, name = %record.name, "upserted technology");
        Ok(record)
    }

    pub fn delete_technology(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut technologies = self.technologies.clone();
        technologies.retain(|t| t.id != id);
        if technologies.len() == self.technologies.len() {
            return Ok(false);
        }
        self.write_document(&technologies, &self.criteria)?;
        self.technologies = technologies;
        Ok(true)
    }

    pub fn upsert_criterion(
        &mut self,
        new_criterion: NewCriterion,
    ) -> Result<Criterion, StorageError> {
        let name = new_criterion.name.trim().to_string();
        if name.is_empty() {
            return Err(StorageError::InvalidInput(
                "criterion name cannot be empty".to_string(),
            ));
        }
        let weight = new_criterion.weight;
        if !weight.is_finite() || clamp_base_weight(weight) != weight {
            return Err(StorageError::InvalidInput(format!(
                "criterion weight must be within [0, {MAX_BASE_WEIGHT}], got {weight}"
            )));
        }

        let lowered = name.to_lowercase();
        let by_name = self
            .criteria
            .iter()
            .position(|c| c.name.to_lowercase() == lowered);
        let slot = match new_criterion.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                let pos = self
                    .criteria
                    .iter()
                    .position(|c| c.id == id)
                    .ok_or_else(|| StorageError::NotFound(format!("criterion {id}")))?;
                if by_name.is_some_and(|other| other != pos) {
                    return Err(StorageError::InvalidInput(format!(
                        "another criterion is already named '{name}'"
                    )));
                }
                Some(pos)
            }
            _ => by_name,
        };

        let description = new_criterion
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let mut criteria = self.criteria.clone();
        let record = if let Some(pos) = slot {
            let existing = criteria
                .get_mut(pos)
                .ok_or_else(|| StorageError::NotFound(format!("criterion #{pos}")))?;
            existing.name = name;
            existing.description = description;
            existing.weight = weight;
            existing.kind = new_criterion.kind;
            existing.active = new_criterion.active;
            existing.clone()
        } else {
            let record = Criterion {
                id: format!("{CRITERION_ID_PREFIX}{}", self.next_criterion_id),
                name,
                description,
                weight,
                kind: new_criterion.kind,
                active: new_criterion.active,
            };
            criteria.push(record.clone());
            record
        };

        self.write_document(&self.technologies, &criteria)?;
        self.criteria = criteria;
        if slot.is_none() {
            self.next_criterion_id += 1;
        }
        debug!(id = %record.id, name = %record.name, weight, "upserted criterion");
        Ok(record)
    }

    pub fn delete_criterion(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut criteria = self.criteria.clone();
        criteria.retain(|c| c.id != id);
        if criteria.len() == self.criteria.len() {
            return Ok(false);
        }
        self.write_document(&self.technologies, &criteria)?;
        self.criteria = criteria;
        Ok(true)
    }

    /// Writes the candidate document. Callers swap it into memory only after
    /// this succeeds, so a failed write leaves the store as it was.
    fn write_document(
        &self,
        technologies: &[Technology],
        criteria: &[Criterion],
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&PersistedView {
            technologies,
            criteria,
        })?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl CatalogBackend for PersistentCatalogStore {
    fn find_technologies_by_ids(&self, ids: &[String]) -> Result<Vec<Technology>, StorageError> {
        Ok(Self::find_technologies_by_ids(self, ids))
    }

    fn find_technologies_by_names(
        &self,
        names: &[String],
    ) -> Result<Vec<Technology>, StorageError> {
        Ok(Self::find_technologies_by_names(self, names))
    }

    fn get_active_criteria(&self) -> Result<Vec<Criterion>, StorageError> {
        Ok(Self::get_active_criteria(self))
    }

    fn list_technologies(&self, limit: usize) -> Vec<Technology> {
        Self::list_technologies(self, limit)
    }

    fn list_criteria(&self) -> Vec<Criterion> {
        Self::list_criteria(self)
    }

    fn upsert_technology(&mut self, new_tech: NewTechnology) -> Result<Technology, StorageError> {
        Self::upsert_technology(self, new_tech)
    }

    fn delete_technology(&mut self, id: &str) -> Result<bool, StorageError> {
        Self::delete_technology(self, id)
    }

    fn upsert_criterion(
        &mut self,
        new_criterion: NewCriterion,
    ) -> Result<Criterion, StorageError> {
        Self::upsert_criterion(self, new_criterion)
    }

    fn delete_criterion(&mut self, id: &str) -> Result<bool, StorageError> {
        Self::delete_criterion(self, id)
    }

    fn stats(&self) -> serde_json::Value {
        Self::stats(self)
    }
}
