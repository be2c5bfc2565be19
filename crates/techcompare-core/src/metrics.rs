use crate::model::{Criterion, CriterionType, Technology};

/// Metric keys backing a criterion type, in lookup order, and whether a
/// higher raw value means a worse outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricBinding {
    pub keys: &'static [&'static str],
    pub inverted: bool,
}

impl CriterionType {
    /// `Custom` has no static keys; its key is derived from the criterion name.
    pub const fn binding(self) -> MetricBinding {
        match self {
            Self::Performance => MetricBinding::direct(&["performance_score"]),
            Self::LearningCurve => MetricBinding {
                keys: &["learning_curve_score"],
                inverted: true,
            },
            Self::Community => {
                MetricBinding::direct(&["community_score", "github_stars", "npm_downloads"])
            }
            Self::Documentation => MetricBinding::direct(&["documentation_score"]),
            Self::Scalability => MetricBinding::direct(&["scalability_score"]),
            Self::Security => MetricBinding::direct(&["security_score"]),
            Self::Maturity => MetricBinding::direct(&["maturity_score", "job_openings"]),
            Self::DeveloperExperience => {
                MetricBinding::direct(&["developer_experience_score", "satisfaction_score"])
            }
            Self::Cost => MetricBinding::direct(&["cost_score"]),
            Self::Custom => MetricBinding::direct(&[]),
        }
    }
}

impl MetricBinding {
    const fn direct(keys: &'static [&'static str]) -> Self {
        Self {
            keys,
            inverted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetric {
    pub key: String,
    pub value: f64,
    pub inverted: bool,
}

/// Metric key used by a `Custom` criterion: lower-cased name, whitespace runs
/// collapsed to a single underscore.
pub fn custom_metric_key(criterion_name: &str) -> String {
    criterion_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

pub struct MetricResolver;

impl MetricResolver {
    pub fn candidate_keys(criterion: &Criterion) -> Vec<String> {
        match criterion.kind {
            CriterionType::Custom => vec![custom_metric_key(&criterion.name)],
            kind => kind
                .binding()
                .keys
                .iter()
                .map(|key| (*key).to_string())
                .collect(),
        }
    }

    /// First candidate key present on the technology. Absence is a normal outcome.
    pub fn resolve(technology: &Technology, criterion: &Criterion) -> Option<ResolvedMetric> {
        let inverted = criterion.kind.binding().inverted;
        Self::candidate_keys(criterion)
            .into_iter()
            .find_map(|key| {
                technology.metric(&key).map(|value| ResolvedMetric {
                    key,
                    value,
                    inverted,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn tech(metrics: &[(&str, f64)]) -> Technology {
        Technology {
            id: "tech-1".to_string(),
            name: "Axum".to_string(),
            category: "backend".to_string(),
            metrics: metrics
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            tags: BTreeSet::new(),
        }
    }

    fn criterion(name: &str, kind: CriterionType) -> Criterion {
        Criterion {
            id: "crit-1".to_string(),
            name: name.to_string(),
            description: None,
            weight: 1.0,
            kind,
            active: true,
        }
    }

    #[test]
    fn resolves_fixed_key() {
        let t = tech(&[("performance_score", 88.0)]);
        let got = MetricResolver::resolve(&t, &criterion("Speed", CriterionType::Performance))
            .expect("resolved");
        assert_eq!(got.key, "performance_score");
        assert_eq!(got.value, 88.0);
        assert!(!got.inverted);
    }

    #[test]
    fn learning_curve_is_flagged_inverted() {
        let t = tech(&[("learning_curve_score", 30.0)]);
        let got = MetricResolver::resolve(&t, &criterion("Ramp-up", CriterionType::LearningCurve))
            .expect("resolved");
        assert!(got.inverted);
    }

    #[test]
    fn falls_back_to_later_candidate() {
        let t = tech(&[("github_stars", 12_000.0)]);
        let got = MetricResolver::resolve(&t, &criterion("Community", CriterionType::Community))
            .expect("resolved");
        assert_eq!(got.key, "github_stars");
    }

    #[test]
    fn custom_criterion_uses_normalized_name() {
        assert_eq!(custom_metric_key("  Bundle   Size "), "bundle_size");
        let t = tech(&[("bundle_size", 42.0)]);
        let got = MetricResolver::resolve(&t, &criterion("Bundle Size", CriterionType::Custom))
            .expect("resolved");
        assert_eq!(got.key, "bundle_size");
    }

    #[test]
    fn missing_metric_is_absent() {
        let t = tech(&[("community_score", 70.0)]);
        assert!(MetricResolver::resolve(&t, &criterion("Sec", CriterionType::Security)).is_none());
    }
}
