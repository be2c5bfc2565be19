use std::collections::BTreeSet;

use crate::metrics::custom_metric_key;
use crate::model::{Criterion, CriterionType, Technology, UserConstraints};

pub const MAX_BASE_WEIGHT: f64 = 10.0;
pub const DEFAULT_PRIORITY_BOOST: f64 = 1.5;

/// Base weight forced into `[0, MAX_BASE_WEIGHT]`; NaN counts as zero.
pub fn clamp_base_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        return 0.0;
    }
    weight.clamp(0.0, MAX_BASE_WEIGHT)
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

impl CriterionType {
    /// Priority tags that make a criterion of this type count for more.
    pub const fn affinity_tags(self) -> &'static [&'static str] {
        match self {
            Self::Performance => &[
                "backend",
                "performance",
                "high-performance",
                "systems",
                "realtime",
                "low-latency",
            ],
            Self::LearningCurve => &["beginner-friendly", "learning", "education", "prototype"],
            Self::Community => &["community", "open-source", "popular"],
            Self::Documentation => &["documentation", "beginner-friendly", "education"],
            Self::Scalability => &[
                "backend",
                "scalability",
                "distributed",
                "cloud",
                "microservices",
                "enterprise",
            ],
            Self::Security => &["security", "enterprise", "fintech", "compliance"],
            Self::Maturity => &["enterprise", "stable", "mature", "lts"],
            Self::DeveloperExperience => {
                &["frontend", "dx", "productivity", "developer-experience"]
            }
            Self::Cost => &["cost", "budget", "free", "startup"],
            Self::Custom => &[],
        }
    }
}

/// A tag is relevant to a criterion when it appears in the type's affinity
/// table or names the criterion itself (type name or name-derived key, with
/// `-` and `_` treated alike).
fn tag_targets_criterion(tag: &str, criterion: &Criterion) -> bool {
    if criterion.kind.affinity_tags().contains(&tag) {
        return true;
    }
    let tag = tag.replace('-', "_");
    tag == criterion.kind.as_str().to_lowercase() || tag == custom_metric_key(&criterion.name)
}

pub struct WeightResolver {
    priority_tags: BTreeSet<String>,
    boost: f64,
}

impl WeightResolver {
    pub fn new(constraints: &UserConstraints, boost: f64) -> Self {
        let priority_tags = constraints
            .priority_tags
            .iter()
            .map(|tag| normalize_tag(tag))
            .filter(|tag| !tag.is_empty())
            .collect();
        Self {
            priority_tags,
            boost: if boost.is_finite() { boost.max(0.0) } else { 1.0 },
        }
    }

    pub fn matches_priority(&self, technology: &Technology) -> bool {
        !self.priority_tags.is_empty()
            && technology
                .tags
                .iter()
                .any(|tag| self.priority_tags.contains(&normalize_tag(tag)))
    }

    /// Whether the technology carries a priority tag aimed at this criterion.
    pub fn boosts(&self, criterion: &Criterion, technology: &Technology) -> bool {
        technology
            .tags
            .iter()
            .map(|tag| normalize_tag(tag))
            .filter(|tag| self.priority_tags.contains(tag))
            .any(|tag| tag_targets_criterion(&tag, criterion))
    }

    pub fn effective_weight(&self, criterion: &Criterion, technology: &Technology) -> f64 {
        let base = clamp_base_weight(criterion.weight);
        if self.boosts(criterion, technology) {
            base * self.boost
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn tech(tags: &[&str]) -> Technology {
        Technology {
            id: "tech-1".to_string(),
            name: "Django".to_string(),
            category: "backend".to_string(),
            metrics: BTreeMap::new(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    fn criterion(weight: f64) -> Criterion {
        typed_criterion("Performance", CriterionType::Performance, weight)
    }

    fn typed_criterion(name: &str, kind: CriterionType, weight: f64) -> Criterion {
        Criterion {
            id: "crit-1".to_string(),
            name: name.to_string(),
            description: None,
            weight,
            kind,
            active: true,
        }
    }

    #[test]
    fn boosts_when_any_tag_matches() {
        let resolver = WeightResolver::new(
            &UserConstraints::with_priority_tags(["Backend", "python"]),
            DEFAULT_PRIORITY_BOOST,
        );
        assert_eq!(resolver.effective_weight(&criterion(2.0), &tech(&["backend"])), 3.0);
    }

    #[test]
    fn boost_only_reaches_criteria_the_tag_targets() {
        let resolver = WeightResolver::new(
            &UserConstraints::with_priority_tags(["backend"]),
            DEFAULT_PRIORITY_BOOST,
        );
        let backend = tech(&["backend"]);
        let community = typed_criterion("Community", CriterionType::Community, 1.0);
        let scalability = typed_criterion("Scalability", CriterionType::Scalability, 4.0);
        assert!(resolver.matches_priority(&backend));
        assert_eq!(resolver.effective_weight(&community, &backend), 1.0);
        assert_eq!(resolver.effective_weight(&scalability, &backend), 6.0);
    }

    #[test]
    fn tag_naming_the_criterion_boosts_it() {
        let resolver = WeightResolver::new(
            &UserConstraints::with_priority_tags(["bundle-size", "learning-curve"]),
            DEFAULT_PRIORITY_BOOST,
        );
        let t = tech(&["bundle-size", "learning-curve"]);
        let custom = typed_criterion("Bundle Size", CriterionType::Custom, 2.0);
        let curve = typed_criterion("Ramp up", CriterionType::LearningCurve, 2.0);
        assert_eq!(resolver.effective_weight(&custom, &t), 3.0);
        assert_eq!(resolver.effective_weight(&curve, &t), 3.0);
    }

    #[test]
    fn leaves_weight_without_match() {
        let resolver = WeightResolver::new(
            &UserConstraints::with_priority_tags(["mobile"]),
            DEFAULT_PRIORITY_BOOST,
        );
        assert_eq!(resolver.effective_weight(&criterion(2.0), &tech(&["backend"])), 2.0);
    }

    #[test]
    fn zero_weight_stays_zero_when_boosted() {
        let resolver = WeightResolver::new(
            &UserConstraints::with_priority_tags(["backend"]),
            DEFAULT_PRIORITY_BOOST,
        );
        assert_eq!(resolver.effective_weight(&criterion(0.0), &tech(&["backend"])), 0.0);
    }

    #[test]
    fn out_of_range_weights_are_clamped() {
        assert_eq!(clamp_base_weight(-3.0), 0.0);
        assert_eq!(clamp_base_weight(25.0), 10.0);
        assert_eq!(clamp_base_weight(f64::NAN), 0.0);
    }

    #[test]
    fn blank_priority_tags_never_match() {
        let resolver = WeightResolver::new(
            &UserConstraints::with_priority_tags(["  "]),
            DEFAULT_PRIORITY_BOOST,
        );
        assert!(!resolver.matches_priority(&tech(&[""])));
    }
}
