use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound of every score and the constant `fullMark` of a radar entry.
pub const FULL_MARK: f64 = 100.0;

/// Number of radar slots a chart can render, and so the largest comparison.
pub const MAX_RADAR_SLOTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Technology {
    /// Raw metric value, treating non-finite numbers as missing.
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied().filter(|v| v.is_finite())
    }

    pub fn has_usable_metrics(&self) -> bool {
        self.metrics.values().any(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionType {
    Performance,
    LearningCurve,
    Community,
    Documentation,
    Scalability,
    Security,
    Maturity,
    DeveloperExperience,
    Cost,
    Custom,
}

impl CriterionType {
    pub const ALL: [Self; 10] = [
        Self::Performance,
        Self::LearningCurve,
        Self::Community,
        Self::Documentation,
        Self::Scalability,
        Self::Security,
        Self::Maturity,
        Self::DeveloperExperience,
        Self::Cost,
        Self::Custom,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "PERFORMANCE",
            Self::LearningCurve => "LEARNING_CURVE",
            Self::Community => "COMMUNITY",
            Self::Documentation => "DOCUMENTATION",
            Self::Scalability => "SCALABILITY",
            Self::Security => "SECURITY",
            Self::Maturity => "MATURITY",
            Self::DeveloperExperience => "DEVELOPER_EXPERIENCE",
            Self::Cost => "COST",
            Self::Custom => "CUSTOM",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().replace(['-', ' '], "_").to_ascii_uppercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == wanted)
    }
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: CriterionType,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

/// User preferences for one comparison. Only `priority_tags` feeds the
/// scoring math; the remaining hints are passed through to narrative text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserConstraints {
    #[serde(default)]
    pub priority_tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
}

impl UserConstraints {
    pub fn with_priority_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority_tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyScore {
    pub technology: Technology,
    pub overall_score: f64,
    pub criterion_scores: BTreeMap<String, f64>,
}

/// One radar spoke. Slot A holds the first compared technology, slot E the fifth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RadarChartData {
    pub subject: String,
    #[serde(rename = "A", default, skip_serializing_if = "Option::is_none")]
    pub a: Option<f64>,
    #[serde(rename = "B", default, skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
    #[serde(rename = "D", default, skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
    #[serde(rename = "E", default, skip_serializing_if = "Option::is_none")]
    pub e: Option<f64>,
    pub full_mark: f64,
}

impl RadarChartData {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            a: None,
            b: None,
            c: None,
            d: None,
            e: None,
            full_mark: FULL_MARK,
        }
    }

    /// Value at 1-based slot `position`; `None` outside 1..=5 or when unfilled.
    pub const fn slot(&self, position: usize) -> Option<f64> {
        match position {
            1 => self.a,
            2 => self.b,
            3 => self.c,
            4 => self.d,
            5 => self.e,
            _ => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, position: usize) -> Option<&mut Option<f64>> {
        match position {
            1 => Some(&mut self.a),
            2 => Some(&mut self.b),
            3 => Some(&mut self.c),
            4 => Some(&mut self.d),
            5 => Some(&mut self.e),
            _ => None,
        }
    }

    pub fn filled_slots(&self) -> usize {
        (1..=MAX_RADAR_SLOTS)
            .filter(|pos| self.slot(*pos).is_some())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KpiType {
    Numeric,
    Percentage,
    Rating,
    Count,
    /// Reserved; no computed metric produces it yet.
    Trend,
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum KpiValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetric {
    pub name: String,
    pub value: KpiValue,
    pub display_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: KpiType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub technology_scores: Vec<TechnologyScore>,
    pub radar_chart_data: Vec<RadarChartData>,
    pub kpi_metrics: BTreeMap<String, Vec<KpiMetric>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub constraints: UserConstraints,
}

impl ComparisonResult {
    /// Technology names from best to worst overall score. Ties keep comparison order.
    pub fn ranking(&self) -> Vec<&str> {
        let mut ordered: Vec<&TechnologyScore> = self.technology_scores.iter().collect();
        ordered.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        ordered
            .into_iter()
            .map(|score| score.technology.name.as_str())
            .collect()
    }
}
