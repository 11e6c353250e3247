//! Score Aggregator: folds deterministic scores and entity ratings into a
//! `ScoringResult` keyed strictly by the rubric. No I/O, cannot fail.

use std::collections::HashMap;

use tracing::debug;

use crate::evaluation::models::{EntityRatings, ExtractedFields, ScoringResult};
use crate::evaluation::rating::best_rating;
use crate::evaluation::rubric::{
    Rubric, CURRENT_COMPANY, CURRENT_JOB_TITLE, CURRENT_LOCATION, PREVIOUS_COMPANIES,
    WILLING_TO_WORK_IN,
};
use crate::evaluation::scorer::score_deterministic;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub scoring: ScoringResult,
    pub total_score: u32,
    pub missing_fields: Vec<String>,
}

/// Every component score the pipeline can compute, before rubric capping.
fn components(fields: &ExtractedFields, ratings: &EntityRatings, rubric: &Rubric) -> HashMap<&'static str, u32> {
    let mut scores: HashMap<&'static str, u32> = score_deterministic(fields, &rubric.rules)
        .into_iter()
        .collect();
    scores.insert(CURRENT_JOB_TITLE, ratings.current_job_title);
    scores.insert(
        CURRENT_COMPANY,
        ratings.current_company.as_ref().map_or(0, |r| r.rating),
    );
    scores.insert(PREVIOUS_COMPANIES, best_rating(&ratings.previous_companies));
    scores.insert(
        CURRENT_LOCATION,
        ratings.current_location.as_ref().map_or(0, |r| r.rating),
    );
    scores.insert(WILLING_TO_WORK_IN, best_rating(&ratings.willing_to_work_in));
    scores
}

/// One score per rubric key, each clamped to its declared range. Keys without a
/// computed component get the lowest score the range allows.
pub fn build_scoring(fields: &ExtractedFields, ratings: &EntityRatings, rubric: &Rubric) -> ScoringResult {
    let computed = components(fields, ratings, rubric);
    let mut scoring = ScoringResult::default();
    for entry in &rubric.entries {
        let raw = match computed.get(entry.field_key.as_str()) {
            Some(score) => *score,
            None => {
                debug!("no scorer for rubric key {}, defaulting to 0", entry.field_key);
                0
            }
        };
        scoring.insert(entry.field_key.clone(), entry.score_range.clamp(raw));
    }
    scoring
}

/// Sum of the component scores, clamped to `[0, rubric max]`.
pub fn total_score(scoring: &ScoringResult, rubric: &Rubric) -> u32 {
    scoring.sum().min(rubric.max_score())
}

/// Fields whose value is null or an empty list, in field order.
pub fn missing_fields(fields: &ExtractedFields) -> Vec<String> {
    fields
        .presence()
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn aggregate(fields: &ExtractedFields, ratings: &EntityRatings, rubric: &Rubric) -> Aggregate {
    let scoring = build_scoring(fields, ratings, rubric);
    let total_score = total_score(&scoring, rubric);
    let missing_fields = missing_fields(fields);
    Aggregate {
        scoring,
        total_score,
        missing_fields,
    }
}
