use std::collections::HashMap;

use crate::metrics::ResolvedMetric;
use crate::model::{Technology, FULL_MARK};

/// Score given when a metric is missing or a batch carries no signal.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Count-like metrics with no natural ceiling.
pub const UNBOUNDED_METRIC_KEYS: [&str; 3] = ["github_stars", "npm_downloads", "job_openings"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricScale {
    /// Already on 0..=100; passed through clamped.
    Bounded,
    /// Scaled against the largest value in the current comparison.
    BatchRelative,
}

impl MetricScale {
    pub fn of(key: &str) -> Self {
        if UNBOUNDED_METRIC_KEYS.contains(&key) {
            Self::BatchRelative
        } else if key.ends_with("_score") {
            Self::Bounded
        } else {
            Self::BatchRelative
        }
    }
}

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return NEUTRAL_SCORE;
    }
    value.clamp(0.0, FULL_MARK)
}

/// Per-key maxima of batch-relative metrics across one comparison set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMaxima {
    maxima: HashMap<String, f64>,
}

impl BatchMaxima {
    pub fn from_technologies(technologies: &[Technology]) -> Self {
        let mut maxima: HashMap<String, f64> = HashMap::new();
        for technology in technologies {
            for (key, raw) in &technology.metrics {
                if !raw.is_finite() || MetricScale::of(key) != MetricScale::BatchRelative {
                    continue;
                }
                let value = raw.max(0.0);
                maxima
                    .entry(key.clone())
                    .and_modify(|current| *current = current.max(value))
                    .or_insert(value);
            }
        }
        Self { maxima }
    }

    pub fn max_for(&self, key: &str) -> Option<f64> {
        self.maxima.get(key).copied()
    }
}

pub struct ScoreNormalizer<'a> {
    batch: &'a BatchMaxima,
}

impl<'a> ScoreNormalizer<'a> {
    pub const fn new(batch: &'a BatchMaxima) -> Self {
        Self { batch }
    }

    pub fn normalize(&self, metric: Option<&ResolvedMetric>) -> f64 {
        let Some(metric) = metric else {
            return NEUTRAL_SCORE;
        };

        let score = match MetricScale::of(&metric.key) {
            MetricScale::Bounded => clamp_score(metric.value),
            MetricScale::BatchRelative => self.batch_relative(&metric.key, metric.value),
        };

        if metric.inverted {
            FULL_MARK - score
        } else {
            score
        }
    }

    fn batch_relative(&self, key: &str, raw: f64) -> f64 {
        let value = raw.max(0.0);
        let max = self.batch.max_for(key).unwrap_or(value).max(value);
        if max <= 0.0 {
            return NEUTRAL_SCORE;
        }
        clamp_score(FULL_MARK * (value / max))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn tech(id: &str, metrics: &[(&str, f64)]) -> Technology {
        Technology {
            id: id.to_string(),
            name: id.to_uppercase(),
            category: "frontend".to_string(),
            metrics: metrics
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
            tags: BTreeSet::new(),
        }
    }

    fn metric(key: &str, value: f64, inverted: bool) -> ResolvedMetric {
        ResolvedMetric {
            key: key.to_string(),
            value,
            inverted,
        }
    }

    #[test]
    fn absent_metric_is_neutral() {
        let batch = BatchMaxima::default();
        assert_eq!(ScoreNormalizer::new(&batch).normalize(None), NEUTRAL_SCORE);
    }

    #[test]
    fn bounded_metric_passes_through_clamped() {
        let batch = BatchMaxima::default();
        let n = ScoreNormalizer::new(&batch);
        assert_eq!(n.normalize(Some(&metric("community_score", 73.5, false))), 73.5);
        assert_eq!(n.normalize(Some(&metric("performance_score", 140.0, false))), 100.0);
        assert_eq!(n.normalize(Some(&metric("satisfaction_score", -4.0, false))), 0.0);
    }

    #[test]
    fn unbounded_metric_scales_to_batch_max() {
        let techs = vec![
            tech("react", &[("github_stars", 200_000.0)]),
            tech("vue", &[("github_stars", 50_000.0)]),
        ];
        let batch = BatchMaxima::from_technologies(&techs);
        let n = ScoreNormalizer::new(&batch);
        assert_eq!(n.normalize(Some(&metric("github_stars", 200_000.0, false))), 100.0);
        assert_eq!(n.normalize(Some(&metric("github_stars", 50_000.0, false))), 25.0);
    }

    #[test]
    fn all_zero_batch_is_neutral() {
        let techs = vec![
            tech("a", &[("npm_downloads", 0.0)]),
            tech("b", &[("npm_downloads", 0.0)]),
        ];
        let batch = BatchMaxima::from_technologies(&techs);
        let n = ScoreNormalizer::new(&batch);
        assert_eq!(n.normalize(Some(&metric("npm_downloads", 0.0, false))), 50.0);
        assert_eq!(n.normalize(Some(&metric("npm_downloads", 0.0, true))), 50.0);
    }

    #[test]
    fn inverted_bounded_metric_flips() {
        let batch = BatchMaxima::default();
        let n = ScoreNormalizer::new(&batch);
        assert_eq!(n.normalize(Some(&metric("learning_curve_score", 30.0, true))), 70.0);
    }

    #[test]
    fn single_sample_batch_hits_full_mark() {
        let techs = vec![tech("solo", &[("job_openings", 1_234.0)])];
        let batch = BatchMaxima::from_technologies(&techs);
        let n = ScoreNormalizer::new(&batch);
        assert_eq!(n.normalize(Some(&metric("job_openings", 1_234.0, false))), 100.0);
    }

    #[test]
    fn unknown_keys_are_batch_relative() {
        assert_eq!(MetricScale::of("bundle_size"), MetricScale::BatchRelative);
        assert_eq!(MetricScale::of("cost_score"), MetricScale::Bounded);
        assert_eq!(MetricScale::of("github_stars"), MetricScale::BatchRelative);
    }
}
