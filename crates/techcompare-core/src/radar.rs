use crate::error::EngineError;
use crate::model::{Criterion, RadarChartData, TechnologyScore};
use crate::normalize::{clamp_score, NEUTRAL_SCORE};
use crate::scoring::{ensure_comparable_count, ensure_distinct_criterion_names};

pub struct RadarChartBuilder;

impl RadarChartBuilder {
    /// One spoke per criterion, in criteria order. Slot k carries the k-th
    /// score in `scores`; a score map without the criterion yields the
    /// neutral value so slot presence always follows technology count.
    pub fn build(
        scores: &[TechnologyScore],
        criteria: &[Criterion],
    ) -> Result<Vec<RadarChartData>, EngineError> {
        ensure_comparable_count(scores.len())?;
        ensure_distinct_criterion_names(criteria)?;

        let spokes = criteria
            .iter()
            .map(|criterion| {
                let mut entry = RadarChartData::new(criterion.name.clone());
                for (position, score) in (1..).zip(scores) {
                    let value = score
                        .criterion_scores
                        .get(&criterion.name)
                        .copied()
                        .map_or(NEUTRAL_SCORE, clamp_score);
                    if let Some(slot) = entry.slot_mut(position) {
                        *slot = Some(value);
                    }
                }
                entry
            })
            .collect();

        Ok(spokes)
    }
}
