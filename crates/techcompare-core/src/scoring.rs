use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::EngineError;
use crate::metrics::MetricResolver;
use crate::model::{Criterion, Technology, TechnologyScore, UserConstraints, MAX_RADAR_SLOTS};
use crate::normalize::{clamp_score, BatchMaxima, ScoreNormalizer, NEUTRAL_SCORE};
use crate::weights::{WeightResolver, DEFAULT_PRIORITY_BOOST};

pub const MIN_COMPARED: usize = 2;
pub const MAX_COMPARED: usize = MAX_RADAR_SLOTS;

pub fn ensure_comparable_count(count: usize) -> Result<(), EngineError> {
    if (MIN_COMPARED..=MAX_COMPARED).contains(&count) {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!(
            "a comparison needs between {MIN_COMPARED} and {MAX_COMPARED} technologies, got {count}"
        )))
    }
}

/// Criterion names key `criterion_scores` and radar spokes, so two active
/// criteria may not share one.
pub fn ensure_distinct_criterion_names(criteria: &[Criterion]) -> Result<(), EngineError> {
    let mut seen = BTreeSet::new();
    for criterion in criteria {
        if !seen.insert(criterion.name.as_str()) {
            return Err(EngineError::InvalidInput(format!(
                "criterion name '{}' appears more than once",
                criterion.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    pub priority_boost: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            priority_boost: DEFAULT_PRIORITY_BOOST,
        }
    }
}

/// How one criterion contributed to a technology's overall score.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionContribution {
    pub criterion: String,
    pub metric_key: Option<String>,
    pub raw_value: Option<f64>,
    pub normalized: f64,
    pub effective_weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct WeightedScoringEngine {
    policy: ScoringPolicy,
}

impl WeightedScoringEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Scores a comparison set of 2..=5 technologies, preserving input order.
    pub fn score(
        &self,
        technologies: &[Technology],
        criteria: &[Criterion],
        constraints: &UserConstraints,
    ) -> Result<Vec<TechnologyScore>, EngineError> {
        ensure_comparable_count(technologies.len())?;
        self.score_batch(technologies, criteria, constraints)
    }

    /// Scores one technology on its own. The batch is just this technology,
    /// so every unbounded metric it carries normalizes to 100.
    pub fn score_one(
        &self,
        technology: &Technology,
        criteria: &[Criterion],
        constraints: &UserConstraints,
    ) -> Result<TechnologyScore, EngineError> {
        let mut scores = self.score_batch(std::slice::from_ref(technology), criteria, constraints)?;
        scores
            .pop()
            .ok_or_else(|| EngineError::InvalidInput("nothing to score".to_string()))
    }

    /// Per-criterion breakdown for every technology in the batch.
    pub fn contributions(
        &self,
        technologies: &[Technology],
        criteria: &[Criterion],
        constraints: &UserConstraints,
    ) -> Vec<Vec<CriterionContribution>> {
        let batch = BatchMaxima::from_technologies(technologies);
        let normalizer = ScoreNormalizer::new(&batch);
        let weights = WeightResolver::new(constraints, self.policy.priority_boost);

        technologies
            .iter()
            .map(|technology| {
                criteria
                    .iter()
                    .map(|criterion| {
                        let resolved = MetricResolver::resolve(technology, criterion);
                        let normalized = normalizer.normalize(resolved.as_ref());
                        CriterionContribution {
                            criterion: criterion.name.clone(),
                            metric_key: resolved.as_ref().map(|m| m.key.clone()),
                            raw_value: resolved.as_ref().map(|m| m.value),
                            normalized,
                            effective_weight: weights.effective_weight(criterion, technology),
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn score_batch(
        &self,
        technologies: &[Technology],
        criteria: &[Criterion],
        constraints: &UserConstraints,
    ) -> Result<Vec<TechnologyScore>, EngineError> {
        ensure_distinct_criterion_names(criteria)?;
        if criteria.is_empty() {
            if let Some(bare) = technologies.iter().find(|t| !t.has_usable_metrics()) {
                return Err(EngineError::InvalidInput(format!(
                    "no criteria supplied and technology '{}' has no usable metrics",
                    bare.name
                )));
            }
        }

        let contributions = self.contributions(technologies, criteria, constraints);
        let scores = technologies
            .iter()
            .zip(contributions)
            .map(|(technology, parts)| {
                let overall_score = overall_from(&parts);
                debug!(
                    technology = %technology.name,
                    overall_score,
                    criteria = parts.len(),
                    "scored technology"
                );
                let criterion_scores = parts
                    .into_iter()
                    .map(|part| (part.criterion, part.normalized))
                    .collect::<BTreeMap<_, _>>();
                TechnologyScore {
                    technology: technology.clone(),
                    overall_score,
                    criterion_scores,
                }
            })
            .collect();

        Ok(scores)
    }
}

/// Weighted mean of normalized scores; a zero weight total is neutral.
fn overall_from(parts: &[CriterionContribution]) -> f64 {
    let total_weight: f64 = parts.iter().map(|p| p.effective_weight).sum();
    if total_weight <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let weighted: f64 = parts
        .iter()
        .map(|p| p.normalized * p.effective_weight)
        .sum();
    clamp_score(weighted / total_weight)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::CriterionType;

    fn tech(name: &str, metrics: &[(&str, f64)], tags: &[&str]) -> Technology {
        Technology {
            id: format!("tech-{}", name.to_lowercase()),
            name: name.to_string(),
            category: "backend".to_string(),
            metrics: metrics
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
            tags: tags.iter().map(|t| (*t).to_string()).collect::<BTreeSet<_>>(),
        }
    }

    fn criterion(name: &str, kind: CriterionType, weight: f64) -> Criterion {
        Criterion {
            id: format!("crit-{}", name.to_lowercase()),
            name: name.to_string(),
            description: None,
            weight,
            kind,
            active: true,
        }
    }

    fn example_pair() -> Vec<Technology> {
        vec![
            tech(
                "A",
                &[("performance_score", 90.0), ("community_score", 40.0)],
                &["backend"],
            ),
            tech(
                "B",
                &[("performance_score", 60.0), ("community_score", 80.0)],
                &[],
            ),
        ]
    }

    fn example_criteria() -> Vec<Criterion> {
        vec![
            criterion("PERFORMANCE", CriterionType::Performance, 2.0),
            criterion("COMMUNITY", CriterionType::Community, 1.0),
        ]
    }

    #[test]
    fn boosted_weighted_average_matches_worked_example() {
        let engine = WeightedScoringEngine::default();
        let constraints = UserConstraints::with_priority_tags(["backend"]);
        let scores = engine
            .score(&example_pair(), &example_criteria(), &constraints)
            .expect("score pair");

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].technology.name, "A");
        assert_eq!(scores[0].overall_score, 77.5);
        assert!((scores[1].overall_score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(scores[0].criterion_scores["PERFORMANCE"], 90.0);
        assert_eq!(scores[1].criterion_scores["COMMUNITY"], 80.0);
    }

    #[test]
    fn effective_weights_show_boost_on_tagged_technology() {
        let engine = WeightedScoringEngine::default();
        let constraints = UserConstraints::with_priority_tags(["backend"]);
        let parts = engine.contributions(&example_pair(), &example_criteria(), &constraints);
        let weights_a: Vec<f64> = parts[0].iter().map(|p| p.effective_weight).collect();
        let weights_b: Vec<f64> = parts[1].iter().map(|p| p.effective_weight).collect();
        assert_eq!(weights_a, vec![3.0, 1.0]);
        assert_eq!(weights_b, vec![2.0, 1.0]);
    }

    #[test]
    fn rejects_batches_outside_two_to_five() {
        let engine = WeightedScoringEngine::default();
        let one = vec![tech("A", &[("performance_score", 1.0)], &[])];
        let six: Vec<Technology> = (0..6)
            .map(|i| tech(&format!("T{i}"), &[("performance_score", 1.0)], &[]))
            .collect();
        let criteria = example_criteria();
        let constraints = UserConstraints::default();

        assert!(matches!(
            engine.score(&one, &criteria, &constraints),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.score(&six, &criteria, &constraints),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(engine.score(&six[..5], &criteria, &constraints).is_ok());
    }

    #[test]
    fn zero_total_weight_is_neutral() {
        let engine = WeightedScoringEngine::default();
        let criteria = vec![
            criterion("PERFORMANCE", CriterionType::Performance, 0.0),
            criterion("COMMUNITY", CriterionType::Community, 0.0),
        ];
        let scores = engine
            .score(&example_pair(), &criteria, &UserConstraints::default())
            .expect("score");
        assert!(scores.iter().all(|s| s.overall_score == NEUTRAL_SCORE));
    }

    #[test]
    fn empty_criteria_need_usable_metrics() {
        let engine = WeightedScoringEngine::default();
        let bare = vec![
            tech("A", &[("performance_score", 70.0)], &[]),
            tech("B", &[], &[]),
        ];
        assert!(matches!(
            engine.score(&bare, &[], &UserConstraints::default()),
            Err(EngineError::InvalidInput(_))
        ));

        let scores = engine
            .score(&example_pair(), &[], &UserConstraints::default())
            .expect("metrics present");
        assert!(scores.iter().all(|s| s.overall_score == NEUTRAL_SCORE));
        assert!(scores.iter().all(|s| s.criterion_scores.is_empty()));
    }

    #[test]
    fn single_technology_normalizes_unbounded_to_full_mark() {
        let engine = WeightedScoringEngine::default();
        let solo = tech("Solo", &[("github_stars", 321.0)], &[]);
        let criteria = vec![criterion("COMMUNITY", CriterionType::Community, 1.0)];
        let score = engine
            .score_one(&solo, &criteria, &UserConstraints::default())
            .expect("score one");
        assert_eq!(score.overall_score, 100.0);
    }

    #[test]
    fn missing_metric_counts_as_neutral() {
        let engine = WeightedScoringEngine::default();
        let techs = vec![
            tech("A", &[("performance_score", 100.0)], &[]),
            tech("B", &[("performance_score", 100.0), ("security_score", 0.0)], &[]),
        ];
        let criteria = vec![
            criterion("PERFORMANCE", CriterionType::Performance, 1.0),
            criterion("SECURITY", CriterionType::Security, 1.0),
        ];
        let scores = engine
            .score(&techs, &criteria, &UserConstraints::default())
            .expect("score");
        assert_eq!(scores[0].criterion_scores["SECURITY"], 50.0);
        assert_eq!(scores[0].overall_score, 75.0);
        assert_eq!(scores[1].overall_score, 50.0);
    }

    #[test]
    fn duplicate_criterion_names_are_rejected() {
        let criteria = vec![
            criterion("Speed", CriterionType::Performance, 1.0),
            criterion("Speed", CriterionType::Security, 1.0),
        ];
        let engine = WeightedScoringEngine::default();
        let constraints = UserConstraints::default();

        let batch = engine.score(&example_pair(), &criteria, &constraints);
        assert!(matches!(batch, Err(EngineError::InvalidInput(msg)) if msg.contains("Speed")));
        assert!(matches!(
            engine.score_one(&example_pair()[0], &criteria, &constraints),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
