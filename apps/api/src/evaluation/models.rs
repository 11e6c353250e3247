//! Data models shared by every evaluation stage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Visa sponsorship answer declared by the candidate. "Unspecified" is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisaRequirement {
    Yes,
    No,
}

impl VisaRequirement {
    /// Parses a form value. Blank input means unspecified.
    pub fn parse(raw: &str) -> Result<Option<Self>, AppError> {
        match raw.trim() {
            "" => Ok(None),
            v if v.eq_ignore_ascii_case("yes") => Ok(Some(Self::Yes)),
            v if v.eq_ignore_ascii_case("no") => Ok(Some(Self::No)),
            other => Err(AppError::Validation(format!(
                "visa_sponsorship_required must be \"Yes\" or \"No\", got {other:?}"
            ))),
        }
    }
}

/// Everything the pipeline needs for one evaluation. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub resume_text: String,
    pub desired_compensation: Option<u64>,
    pub locations_willing_to_work: Vec<String>,
    pub visa_sponsorship_required: Option<VisaRequirement>,
}

impl ExtractionRequest {
    /// Builds a request from raw form values, applying type coercion only.
    pub fn from_form(
        resume_text: String,
        desired_compensation: Option<&str>,
        locations_willing_to_work: Option<&str>,
        visa_sponsorship_required: Option<&str>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            resume_text,
            desired_compensation: desired_compensation
                .map(parse_compensation)
                .transpose()?
                .flatten(),
            locations_willing_to_work: check_locations(
                locations_willing_to_work
                    .map(split_locations)
                    .unwrap_or_default(),
            )?,
            visa_sponsorship_required: visa_sponsorship_required
                .map(VisaRequirement::parse)
                .transpose()?
                .flatten(),
        })
    }
}

/// Coerces a compensation value to a positive integer. Blank means not given.
pub fn parse_compensation(raw: &str) -> Result<Option<u64>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| {
        AppError::Validation(format!("desired_compensation must be a number, got {raw:?}"))
    })?;
    if !value.is_finite() || value < 1.0 {
        return Err(AppError::Validation(
            "desired_compensation must be a positive integer".to_string(),
        ));
    }
    Ok(Some(value.round() as u64))
}

/// Upper bound on declared locations. Each one costs a classifier call.
pub const MAX_LOCATIONS: usize = 20;

/// Rejects location lists longer than `MAX_LOCATIONS`.
pub fn check_locations(locations: Vec<String>) -> Result<Vec<String>, AppError> {
    if locations.len() > MAX_LOCATIONS {
        return Err(AppError::Validation(format!(
            "locations_willing_to_work accepts at most {MAX_LOCATIONS} entries, got {}",
            locations.len()
        )));
    }
    Ok(locations)
}

/// Splits a comma-separated location list into trimmed, non-empty entries.
pub fn split_locations(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction output
// ────────────────────────────────────────────────────────────────────────────

/// Resume-derived and user-declared fields. Each field is independently
/// nullable; list fields use an empty list for "nothing".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub full_name: Option<String>,
    pub employment_status: Option<String>,
    pub highest_education_level: Option<String>,
    pub current_job_title: Option<String>,
    pub years_of_experience: Option<f64>,
    pub current_company: Option<String>,
    pub previous_companies: Vec<String>,
    pub current_location: Option<String>,
    pub desired_compensation: Option<u64>,
    pub willing_to_work_in: Vec<String>,
    pub visa_sponsorship_required: Option<VisaRequirement>,
}

impl ExtractedFields {
    /// `(field name, has a value)` for every field, in declaration order.
    pub fn presence(&self) -> [(&'static str, bool); 11] {
        [
            ("full_name", self.full_name.is_some()),
            ("employment_status", self.employment_status.is_some()),
            (
                "highest_education_level",
                self.highest_education_level.is_some(),
            ),
            ("current_job_title", self.current_job_title.is_some()),
            ("years_of_experience", self.years_of_experience.is_some()),
            ("current_company", self.current_company.is_some()),
            ("previous_companies", !self.previous_companies.is_empty()),
            ("current_location", self.current_location.is_some()),
            ("desired_compensation", self.desired_compensation.is_some()),
            ("willing_to_work_in", !self.willing_to_work_in.is_empty()),
            (
                "visa_sponsorship_required",
                self.visa_sponsorship_required.is_some(),
            ),
        ]
    }
}

/// A bounded desirability score attached to an open-ended name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRating {
    pub name: String,
    pub rating: u32,
}

/// Ratings for every open-ended entity field, plus the job-title tier score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityRatings {
    pub current_job_title: u32,
    pub current_company: Option<EntityRating>,
    pub previous_companies: Vec<EntityRating>,
    pub current_location: Option<EntityRating>,
    pub willing_to_work_in: Vec<EntityRating>,
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Rubric key → score. Always holds exactly the rubric's keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoringResult(BTreeMap<String, u32>);

impl ScoringResult {
    pub fn insert(&mut self, key: impl Into<String>, score: u32) {
        self.0.insert(key.into(), score);
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<u32> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn sum(&self) -> u32 {
        self.0.values().sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Summary & outcome
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(alias = "accept", alias = "ACCEPT")]
    Accept,
    #[serde(alias = "reject", alias = "REJECT")]
    Reject,
}

/// Whether the prose came from the classifier or was fabricated after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Parsed,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub recommendation: Recommendation,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub summary: Summary,
    pub status: SummaryStatus,
}

/// Extracted fields as returned to the caller: entity names replaced by their
/// rating records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledFields {
    pub full_name: Option<String>,
    pub employment_status: Option<String>,
    pub highest_education_level: Option<String>,
    pub current_job_title: Option<String>,
    pub years_of_experience: Option<f64>,
    pub current_company: Option<EntityRating>,
    pub previous_companies: Vec<EntityRating>,
    pub current_location: Option<EntityRating>,
    pub desired_compensation: Option<u64>,
    pub willing_to_work_in: Vec<EntityRating>,
    pub visa_sponsorship_required: Option<VisaRequirement>,
}

/// The single response record for one evaluation. Never mutated after assembly.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub rubric_version: String,
    pub extracted_fields: AssembledFields,
    pub scoring: ScoringResult,
    pub total_score: u32,
    pub max_score: u32,
    pub threshold: u32,
    pub missing_fields: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub recommendation: Recommendation,
    pub explanation: String,
    pub summary_status: SummaryStatus,
}
