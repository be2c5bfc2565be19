use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use techcompare_core::{
    ensure_comparable_count, ComparisonResult, Criterion, EngineError, KpiMetricCalculator,
    RadarChartBuilder, ScoringPolicy, Technology, TechnologyScore, UserConstraints,
    WeightedScoringEngine,
};
use techcompare_insight::{NarrativeProvider, NarrativeRequest};
use techcompare_storage::{SharedCatalog, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<EngineError> for ComparisonError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => Self::InvalidInput(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on the narrative call; past it the summary is dropped.
    pub narrative_timeout: Duration,
    pub scoring: ScoringPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            narrative_timeout: Duration::from_millis(8_000),
            scoring: ScoringPolicy::default(),
        }
    }
}

pub struct ComparisonOrchestrator {
    catalog: SharedCatalog,
    narrator: Option<Arc<dyn NarrativeProvider>>,
    engine: WeightedScoringEngine,
    config: OrchestratorConfig,
}

impl ComparisonOrchestrator {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self::with_config(catalog, OrchestratorConfig::default())
    }

    pub fn with_config(catalog: SharedCatalog, config: OrchestratorConfig) -> Self {
        Self {
            catalog,
            narrator: None,
            engine: WeightedScoringEngine::new(config.scoring.clone()),
            config,
        }
    }

    #[must_use]
    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeProvider>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub async fn generate_comparison(
        &self,
        technology_ids: &[String],
        constraints: UserConstraints,
    ) -> Result<ComparisonResult, ComparisonError> {
        ensure_comparable_count(technology_ids.len())?;
        let ids = clean_identifiers(technology_ids, "technology id", |id| id.to_string())?;

        let (found, criteria) = {
            let catalog = self.catalog.read();
            (
                catalog.find_technologies_by_ids(&ids)?,
                catalog.get_active_criteria()?,
            )
        };
        let ordered = order_as_requested(&ids, found, |t| t.id.clone())?;
        self.compose(ordered, &criteria, constraints).await
    }

    pub async fn generate_comparison_by_names(
        &self,
        technology_names: &[String],
        constraints: UserConstraints,
    ) -> Result<ComparisonResult, ComparisonError> {
        ensure_comparable_count(technology_names.len())?;
        let names = clean_identifiers(technology_names, "technology name", str::to_lowercase)?;

        let (found, criteria) = {
            let catalog = self.catalog.read();
            (
                catalog.find_technologies_by_names(&names)?,
                catalog.get_active_criteria()?,
            )
        };
        let ordered = order_as_requested(&names, found, |t| t.name.to_lowercase())?;
        self.compose(ordered, &criteria, constraints).await
    }

    /// Scores one technology against the active criteria on its own.
    pub fn score_technology(
        &self,
        technology_id: &str,
        constraints: &UserConstraints,
    ) -> Result<TechnologyScore, ComparisonError> {
        let id = technology_id.trim();
        if id.is_empty() {
            return Err(ComparisonError::InvalidInput(
                "technology id cannot be empty".to_string(),
            ));
        }
        let (found, criteria) = {
            let catalog = self.catalog.read();
            (
                catalog.find_technologies_by_ids(&[id.to_string()])?,
                catalog.get_active_criteria()?,
            )
        };
        let technology = found
            .into_iter()
            .next()
            .ok_or_else(|| ComparisonError::NotFound(format!("technology {id}")))?;
        Ok(self.engine.score_one(&technology, &criteria, constraints)?)
    }

    async fn compose(
        &self,
        technologies: Vec<Technology>,
        criteria: &[Criterion],
        constraints: UserConstraints,
    ) -> Result<ComparisonResult, ComparisonError> {
        let started = Instant::now();
        let technology_scores = self.engine.score(&technologies, criteria, &constraints)?;
        let radar_chart_data = RadarChartBuilder::build(&technology_scores, criteria)?;
        let kpi_metrics: BTreeMap<String, _> = technology_scores
            .iter()
            .map(|score| {
                (
                    score.technology.name.clone(),
                    KpiMetricCalculator::calculate(score, &score.technology),
                )
            })
            .collect();

        let summary = self.narrate(&technology_scores, &constraints).await;
        info!(
            technologies = technology_scores.len(),
            criteria = criteria.len(),
            summary = summary.is_some(),
            elapsed_ms = started.elapsed().as_millis(),
            "comparison generated"
        );

        Ok(ComparisonResult {
            technology_scores,
            radar_chart_data,
            kpi_metrics,
            summary,
            generated_at: Utc::now(),
            constraints,
        })
    }

    /// Best effort: any provider error or a timeout yields no summary.
    async fn narrate(
        &self,
        scores: &[TechnologyScore],
        constraints: &UserConstraints,
    ) -> Option<String> {
        let narrator = self.narrator.as_ref()?;
        let request = NarrativeRequest::from_scores(scores, constraints);
        match tokio::time::timeout(self.config.narrative_timeout, narrator.summarize(request)).await
        {
            Ok(Ok(response)) => {
                debug!(
                    provider = %response.provider,
                    model = %response.model,
                    "narrative summary received"
                );
                Some(response.summary)
            }
            Ok(Err(err)) => {
                warn!(provider = narrator.name(), error = %err, "narrative summary failed");
                None
            }
            Err(_) => {
                warn!(
                    provider = narrator.name(),
                    timeout_ms = self.config.narrative_timeout.as_millis(),
                    "narrative summary timed out"
                );
                None
            }
        }
    }
}

/// Trims identifiers and rejects blanks and duplicates under `key`.
fn clean_identifiers(
    raw: &[String],
    label: &str,
    key: impl Fn(&str) -> String,
) -> Result<Vec<String>, ComparisonError> {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ComparisonError::InvalidInput(format!(
                "{label} cannot be empty"
            )));
        }
        let normalized = key(trimmed);
        if !seen.insert(normalized.clone()) {
            return Err(ComparisonError::InvalidInput(format!(
                "duplicate {label}: {trimmed}"
            )));
        }
        out.push(normalized);
    }
    Ok(out)
}

/// Arranges lookup results in request order. Every requested key must resolve.
fn order_as_requested(
    requested: &[String],
    found: Vec<Technology>,
    key: impl Fn(&Technology) -> String,
) -> Result<Vec<Technology>, ComparisonError> {
    let mut by_key: BTreeMap<String, Technology> =
        found.into_iter().map(|t| (key(&t), t)).collect();
    let mut ordered = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for wanted in requested {
        match by_key.remove(wanted) {
            Some(technology) => ordered.push(technology),
            None => missing.push(wanted.as_str()),
        }
    }
    if missing.is_empty() {
        Ok(ordered)
    } else {
        Err(ComparisonError::NotFound(format!(
            "technologies not in catalog: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn clean_identifiers_rejects_case_insensitive_duplicates() {
        let err = clean_identifiers(
            &strings(&["React", " react "]),
            "technology name",
            str::to_lowercase,
        )
        .expect_err("duplicate");
        assert!(matches!(err, ComparisonError::InvalidInput(_)));

        let ids = clean_identifiers(&strings(&["tech-1", "TECH-1"]), "technology id", |id| {
            id.to_string()
        })
        .expect("ids compare exactly");
        assert_eq!(ids, strings(&["tech-1", "TECH-1"]));
    }

    #[test]
    fn clean_identifiers_rejects_blanks() {
        let err = clean_identifiers(&strings(&["tech-1", "  "]), "technology id", |id| {
            id.to_string()
        })
        .expect_err("blank");
        assert!(matches!(err, ComparisonError::InvalidInput(_)));
    }

    #[test]
    fn order_follows_request_and_reports_missing() {
        let tech = |id: &str| Technology {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: "x".to_string(),
            metrics: BTreeMap::new(),
            tags: std::collections::BTreeSet::new(),
        };
        let ordered = order_as_requested(
            &strings(&["b", "a"]),
            vec![tech("a"), tech("b")],
            |t| t.id.clone(),
        )
        .expect("ordered");
        let ids: Vec<&str> = ordered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let err = order_as_requested(&strings(&["a", "zz"]), vec![tech("a")], |t| t.id.clone())
            .expect_err("missing");
        assert!(matches!(err, ComparisonError::NotFound(msg) if msg.contains("zz")));
    }

    #[test]
    fn engine_errors_map_to_invalid_input() {
        let err: ComparisonError = EngineError::InvalidInput("too few".to_string()).into();
        assert!(matches!(err, ComparisonError::InvalidInput(msg) if msg == "too few"));
    }
}
