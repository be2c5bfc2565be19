use crate::model::{KpiMetric, KpiType, KpiValue, Technology, TechnologyScore};
use crate::normalize::MetricScale;

const RATING_SCALE: f64 = 5.0;

struct MetricLabel {
    key: &'static str,
    name: &'static str,
    description: &'static str,
}

static METRIC_LABELS: [MetricLabel; 14] = [
    MetricLabel {
        key: "performance_score",
        name: "Performance",
        description: "Runtime performance on a 0-100 scale.",
    },
    MetricLabel {
        key: "learning_curve_score",
        name: "Learning Curve",
        description: "Difficulty of getting productive; lower is easier.",
    },
    MetricLabel {
        key: "community_score",
        name: "Community",
        description: "Community size and activity on a 0-100 scale.",
    },
    MetricLabel {
        key: "documentation_score",
        name: "Documentation",
        description: "Quality and coverage of official documentation.",
    },
    MetricLabel {
        key: "scalability_score",
        name: "Scalability",
        description: "Ability to grow with load and team size.",
    },
    MetricLabel {
        key: "security_score",
        name: "Security",
        description: "Security track record and defaults.",
    },
    MetricLabel {
        key: "maturity_score",
        name: "Maturity",
        description: "Stability and age of the ecosystem.",
    },
    MetricLabel {
        key: "developer_experience_score",
        name: "Developer Experience",
        description: "Tooling and ergonomics for day-to-day work.",
    },
    MetricLabel {
        key: "satisfaction_score",
        name: "Developer Satisfaction",
        description: "Share of developers who would use it again.",
    },
    MetricLabel {
        key: "cost_score",
        name: "Affordability",
        description: "Total cost of ownership; higher is cheaper.",
    },
    MetricLabel {
        key: "github_stars",
        name: "GitHub Stars",
        description: "Stars on the main repository.",
    },
    MetricLabel {
        key: "npm_downloads",
        name: "npm Downloads",
        description: "Weekly package downloads.",
    },
    MetricLabel {
        key: "job_openings",
        name: "Job Openings",
        description: "Open positions mentioning the technology.",
    },
    MetricLabel {
        key: "release_frequency",
        name: "Release Frequency",
        description: "Releases per year.",
    },
];

fn label_for(key: &str) -> Option<&'static MetricLabel> {
    METRIC_LABELS.iter().find(|label| label.key == key)
}

/// Display type of a raw metric: 0-100 scores read as percentages,
/// everything else as a plain number.
pub fn metric_kpi_type(key: &str) -> KpiType {
    if MetricScale::of(key) == MetricScale::Bounded {
        KpiType::Percentage
    } else {
        KpiType::Numeric
    }
}

fn title_case(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Integer rendering with `,` between thousands groups.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_display(kind: KpiType, value: &KpiValue) -> String {
    match (kind, value) {
        (_, KpiValue::Text(text)) => text.clone(),
        (KpiType::Percentage, KpiValue::Number(v)) => format!("{v:.1}%"),
        (KpiType::Count, KpiValue::Number(v)) => format_thousands(*v),
        (KpiType::Numeric, KpiValue::Number(v)) => format!("{v:.2}"),
        (KpiType::Rating, KpiValue::Number(v)) => format!("{v:.1}/5"),
        (KpiType::Trend, KpiValue::Number(v)) => format!("{v:+.2}"),
        (KpiType::Categorical, KpiValue::Number(v)) => v.to_string(),
    }
}

fn kpi(
    name: impl Into<String>,
    kind: KpiType,
    value: KpiValue,
    unit: Option<&str>,
    description: Option<&str>,
) -> KpiMetric {
    KpiMetric {
        name: name.into(),
        display_value: format_display(kind, &value),
        value,
        unit: unit.map(ToString::to_string),
        description: description.map(ToString::to_string),
        kind,
    }
}

pub struct KpiMetricCalculator;

impl KpiMetricCalculator {
    /// Overall rating first, then each raw metric by key, then the tag count.
    pub fn calculate(score: &TechnologyScore, technology: &Technology) -> Vec<KpiMetric> {
        let mut out = Vec::with_capacity(technology.metrics.len() + 2);

        out.push(kpi(
            "Overall Rating",
            KpiType::Rating,
            KpiValue::Number(round_to(score.overall_score / 20.0, 1).clamp(0.0, RATING_SCALE)),
            Some("/5"),
            Some("Weighted overall score on a five point scale."),
        ));

        for (key, raw) in &technology.metrics {
            if !raw.is_finite() {
                continue;
            }
            let kind = metric_kpi_type(key);
            let label = label_for(key);
            let name = label.map_or_else(|| title_case(key), |l| l.name.to_string());
            out.push(kpi(
                name,
                kind,
                KpiValue::Number(*raw),
                (kind == KpiType::Percentage).then_some("%"),
                label.map(|l| l.description),
            ));
        }

        #[allow(clippy::cast_precision_loss)]
        let tag_count = technology.tags.len() as f64;
        out.push(kpi(
            "Tags",
            KpiType::Count,
            KpiValue::Number(tag_count),
            None,
            Some("Number of descriptive tags."),
        ));

        out
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;

    fn technology() -> Technology {
        Technology {
            id: "tech-1".to_string(),
            name: "React".to_string(),
            category: "frontend".to_string(),
            metrics: BTreeMap::from([
                ("performance_score".to_string(), 82.0),
                ("github_stars".to_string(), 221_456.0),
                ("bundle_size".to_string(), 42.5),
            ]),
            tags: BTreeSet::from(["frontend".to_string(), "ui".to_string()]),
        }
    }

    fn scored(overall: f64) -> TechnologyScore {
        TechnologyScore {
            technology: technology(),
            overall_score: overall,
            criterion_scores: BTreeMap::new(),
        }
    }

    #[test]
    fn produces_rating_metrics_and_tag_count_in_order() {
        let tech = technology();
        let kpis = KpiMetricCalculator::calculate(&scored(77.5), &tech);
        let names: Vec<&str> = kpis.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Overall Rating",
                "Bundle Size",
                "GitHub Stars",
                "Performance",
                "Tags"
            ]
        );

        assert_eq!(kpis[0].kind, KpiType::Rating);
        assert_eq!(kpis[0].display_value, "3.9/5");
        assert_eq!(kpis[1].display_value, "42.50");
        assert_eq!(kpis[2].kind, KpiType::Numeric);
        assert_eq!(kpis[3].kind, KpiType::Percentage);
        assert_eq!(kpis[3].display_value, "82.0%");
        assert_eq!(kpis[3].unit.as_deref(), Some("%"));
        assert_eq!(kpis[4].kind, KpiType::Count);
        assert_eq!(kpis[4].display_value, "2");
    }

    #[test]
    fn rating_rounds_to_one_decimal() {
        let tech = technology();
        let kpis = KpiMetricCalculator::calculate(&scored(100.0), &tech);
        assert_eq!(kpis[0].value, KpiValue::Number(5.0));
        assert_eq!(kpis[0].display_value, "5.0/5");
    }

    #[test]
    fn formats_every_kpi_type() {
        assert_eq!(format_display(KpiType::Count, &KpiValue::Number(1_234_567.0)), "1,234,567");
        assert_eq!(format_display(KpiType::Count, &KpiValue::Number(999.0)), "999");
        assert_eq!(format_display(KpiType::Count, &KpiValue::Number(-1_000.0)), "-1,000");
        assert_eq!(format_display(KpiType::Percentage, &KpiValue::Number(66.666)), "66.7%");
        assert_eq!(format_display(KpiType::Numeric, &KpiValue::Number(3.14159)), "3.14");
        assert_eq!(format_display(KpiType::Trend, &KpiValue::Number(1.5)), "+1.50");
        assert_eq!(
            format_display(KpiType::Categorical, &KpiValue::Text("Mature".to_string())),
            "Mature"
        );
    }

    #[test]
    fn title_cases_unknown_keys() {
        assert_eq!(title_case("bundle_size"), "Bundle Size");
        assert_eq!(title_case("cold-start_ms"), "Cold Start Ms");
    }
}
