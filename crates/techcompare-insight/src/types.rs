use std::collections::BTreeMap;

use techcompare_core::{TechnologyScore, UserConstraints};

/// Scoring outcome for one compared technology, as handed to a narrative provider.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeSubject {
    pub name: String,
    pub category: String,
    pub overall_score: f64,
    pub criterion_scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeRequest {
    pub subjects: Vec<NarrativeSubject>,
    pub priority_tags: Vec<String>,
    pub project_type: Option<String>,
    pub team_size: Option<String>,
    pub timeline: Option<String>,
}

impl NarrativeRequest {
    pub fn from_scores(scores: &[TechnologyScore], constraints: &UserConstraints) -> Self {
        Self {
            subjects: scores
                .iter()
                .map(|score| NarrativeSubject {
                    name: score.technology.name.clone(),
                    category: score.technology.category.clone(),
                    overall_score: score.overall_score,
                    criterion_scores: score.criterion_scores.clone(),
                })
                .collect(),
            priority_tags: constraints.priority_tags.iter().cloned().collect(),
            project_type: constraints.project_type.clone(),
            team_size: constraints.team_size.clone(),
            timeline: constraints.timeline.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NarrativeResponse {
    pub provider: String,
    pub model: String,
    pub summary: String,
}
