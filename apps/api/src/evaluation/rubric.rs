//! Rubric: the versioned scoring table. Data, not code: score ranges, the
//! accept threshold, the critical-field set and every deterministic threshold
//! live here so a deployment can swap rubric versions without a rebuild.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluation::models::ExtractedFields;

// Score component keys the pipeline knows how to compute.
pub const EMPLOYMENT_STATUS: &str = "employment_status";
pub const HIGHEST_EDUCATION_LEVEL: &str = "highest_education_level";
pub const CURRENT_JOB_TITLE: &str = "current_job_title";
pub const YEARS_OF_EXPERIENCE: &str = "years_of_experience";
pub const CURRENT_COMPANY: &str = "current_company";
pub const PREVIOUS_COMPANIES: &str = "previous_companies";
pub const VISA_SPONSORSHIP: &str = "visa_sponsorship";
pub const DESIRED_COMPENSATION: &str = "desired_compensation";
pub const CURRENT_LOCATION: &str = "current_location";
pub const WILLING_TO_WORK_IN: &str = "willing_to_work_in";

#[derive(Debug, Error, PartialEq)]
pub enum RubricError {
    #[error("rubric has no entries")]
    Empty,

    #[error("duplicate rubric key: {0}")]
    DuplicateKey(String),

    #[error("rubric entry {key} has min {min} above max {max}")]
    InvertedRange { key: String, min: u32, max: u32 },

    #[error("critical field {0} is not an extracted field")]
    UnknownCriticalField(String),

    #[error("threshold {threshold} exceeds rubric maximum {max}")]
    ThresholdAboveMax { threshold: u32, max: u32 },
}

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl ScoreRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: u32) -> u32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricEntry {
    pub field_key: String,
    pub score_range: ScoreRange,
    pub rule_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub version: String,
    pub entries: Vec<RubricEntry>,
    /// Minimum total for the higher-tier recommendation.
    pub threshold: u32,
    /// Extracted fields whose absence forces the lower-tier recommendation.
    #[serde(default)]
    pub critical_fields: Vec<String>,
    #[serde(default)]
    pub rules: ScoringRules,
}

// ────────────────────────────────────────────────────────────────────────────
// Deterministic rule parameters
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRule {
    pub employed: u32,
    pub unemployed: u32,
}

/// One education tier: any keyword found (case-insensitive) awards `points`.
/// Tiers are checked in order, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationTier {
    pub keywords: Vec<String>,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRule {
    /// `0..=junior_max_years` is the junior band.
    pub junior_max_years: f64,
    pub junior_points: u32,
    pub sweet_spot_min_years: f64,
    pub sweet_spot_max_years: f64,
    pub sweet_spot_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationRule {
    /// Below this scores nothing.
    pub low_threshold: u64,
    /// `low_threshold..=mid_ceiling` scores `mid_points`; above scores `high_points`.
    pub mid_ceiling: u64,
    pub mid_points: u32,
    pub high_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTitleTiers {
    pub high: u32,
    pub mid: u32,
    pub low: u32,
}

/// Ranges the classifier is asked to rate open-ended entities within.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRanges {
    pub current_company: ScoreRange,
    pub previous_company: ScoreRange,
    pub location: ScoreRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub employment: EmploymentRule,
    pub education_tiers: Vec<EducationTier>,
    pub experience: ExperienceRule,
    pub visa_not_required_points: u32,
    pub compensation: CompensationRule,
    pub job_title_tiers: JobTitleTiers,
    pub ratings: RatingRanges,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            employment: EmploymentRule {
                employed: 10,
                unemployed: 6,
            },
            education_tiers: vec![
                EducationTier {
                    keywords: vec!["phd".into(), "doctor".into(), "master".into()],
                    points: 10,
                },
                EducationTier {
                    keywords: vec!["bachelor".into()],
                    points: 9,
                },
            ],
            experience: ExperienceRule {
                junior_max_years: 2.0,
                junior_points: 2,
                sweet_spot_min_years: 3.0,
                sweet_spot_max_years: 15.0,
                sweet_spot_points: 10,
            },
            visa_not_required_points: 10,
            compensation: CompensationRule {
                low_threshold: 100_000,
                mid_ceiling: 140_000,
                mid_points: 8,
                high_points: 10,
            },
            job_title_tiers: JobTitleTiers {
                high: 10,
                mid: 5,
                low: 0,
            },
            ratings: RatingRanges {
                current_company: ScoreRange::new(0, 6),
                previous_company: ScoreRange::new(0, 4),
                location: ScoreRange::new(1, 5),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rubric
// ────────────────────────────────────────────────────────────────────────────

fn entry(key: &str, min: u32, max: u32, rule: &str) -> RubricEntry {
    RubricEntry {
        field_key: key.to_string(),
        score_range: ScoreRange::new(min, max),
        rule_description: rule.to_string(),
    }
}

impl Rubric {
    /// The full-service bundle rubric: ten components, 80 points, accept at 65.
    pub fn builtin() -> Self {
        Self {
            version: "2025-full-service".to_string(),
            entries: vec![
                entry(EMPLOYMENT_STATUS, 0, 10, "Employed 10, Unemployed 6, unknown 0"),
                entry(
                    HIGHEST_EDUCATION_LEVEL,
                    0,
                    10,
                    "PhD/Doctorate/Master 10, Bachelor 9, otherwise 0",
                ),
                entry(CURRENT_JOB_TITLE, 0, 10, "Tier HIGH 10, MID 5, LOW 0"),
                entry(
                    YEARS_OF_EXPERIENCE,
                    0,
                    10,
                    "3-15 years 10, 0-2 years 2, above 15 years 0",
                ),
                entry(CURRENT_COMPANY, 0, 6, "Company rating 0-6"),
                entry(
                    PREVIOUS_COMPANIES,
                    0,
                    4,
                    "Best previous company rating, capped at 4",
                ),
                entry(VISA_SPONSORSHIP, 0, 10, "No sponsorship needed 10, otherwise 0"),
                entry(
                    DESIRED_COMPENSATION,
                    0,
                    10,
                    "Below 100k 0, 100k-140k 8, above 140k 10",
                ),
                entry(CURRENT_LOCATION, 0, 5, "Location rating 1-5, unknown 0"),
                entry(
                    WILLING_TO_WORK_IN,
                    0,
                    5,
                    "Best willing-to-work location rating, capped at 5",
                ),
            ],
            threshold: 65,
            critical_fields: vec![
                "current_job_title".to_string(),
                "years_of_experience".to_string(),
            ],
            rules: ScoringRules::default(),
        }
    }

    /// Loads and validates a rubric from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rubric file: {}", path.display()))?;
        let rubric: Rubric = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rubric JSON: {}", path.display()))?;
        rubric
            .validate()
            .with_context(|| format!("Invalid rubric: {}", path.display()))?;
        Ok(rubric)
    }

    pub fn validate(&self) -> Result<(), RubricError> {
        if self.entries.is_empty() {
            return Err(RubricError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for e in &self.entries {
            if !seen.insert(e.field_key.as_str()) {
                return Err(RubricError::DuplicateKey(e.field_key.clone()));
            }
            if e.score_range.min > e.score_range.max {
                return Err(RubricError::InvertedRange {
                    key: e.field_key.clone(),
                    min: e.score_range.min,
                    max: e.score_range.max,
                });
            }
        }
        let known = ExtractedFields::default().presence();
        if let Some(unknown) = self
            .critical_fields
            .iter()
            .find(|f| !known.iter().any(|(name, _)| *name == f.as_str()))
        {
            return Err(RubricError::UnknownCriticalField(unknown.clone()));
        }
        let max = self.max_score();
        if self.threshold > max {
            return Err(RubricError::ThresholdAboveMax {
                threshold: self.threshold,
                max,
            });
        }
        Ok(())
    }

    /// Total possible score: the sum of every entry's maximum.
    pub fn max_score(&self) -> u32 {
        self.entries.iter().map(|e| e.score_range.max).sum()
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_rubric_totals_80_with_threshold_65() {
        let rubric = Rubric::builtin();
        assert_eq!(rubric.max_score(), 80);
        assert_eq!(rubric.threshold, 65);
        assert_eq!(rubric.entries.len(), 10);
        assert!(rubric.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicate_keys() {
        let mut rubric = Rubric::builtin();
        rubric.entries.push(entry(VISA_SPONSORSHIP, 0, 1, "dup"));
        assert_eq!(
            rubric.validate(),
            Err(RubricError::DuplicateKey(VISA_SPONSORSHIP.to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut rubric = Rubric::builtin();
        rubric.entries[0].score_range = ScoreRange::new(5, 2);
        assert!(matches!(
            rubric.validate(),
            Err(RubricError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_critical_field() {
        let mut rubric = Rubric::builtin();
        rubric.critical_fields.push("favourite_colour".to_string());
        assert_eq!(
            rubric.validate(),
            Err(RubricError::UnknownCriticalField("favourite_colour".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_unreachable_threshold() {
        let mut rubric = Rubric::builtin();
        rubric.threshold = 81;
        assert!(matches!(
            rubric.validate(),
            Err(RubricError::ThresholdAboveMax { threshold: 81, max: 80 })
        ));
    }

    #[test]
    fn test_rubric_deserializes_without_rules_using_defaults() {
        // A smaller, older rubric variant: different field set, scale and threshold.
        let json = r#"{
            "version": "2024-lite",
            "entries": [
                {"field_key": "employment_status", "score_range": {"min": 0, "max": 10}, "rule_description": "employed"},
                {"field_key": "willing_to_work_in", "score_range": {"min": 0, "max": 5}, "rule_description": "locations"}
            ],
            "threshold": 12
        }"#;
        let rubric: Rubric = serde_json::from_str(json).unwrap();
        assert!(rubric.validate().is_ok());
        assert_eq!(rubric.max_score(), 15);
        assert!(rubric.critical_fields.is_empty());
        assert_eq!(rubric.rules, ScoringRules::default());
    }

    #[test]
    fn test_from_json_file_reports_missing_file() {
        let err = Rubric::from_json_file(Path::new("/nonexistent/rubric.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read rubric file"));
    }

    #[test]
    fn test_score_range_clamp_and_contains() {
        let range = ScoreRange::new(1, 5);
        assert_eq!(range.clamp(0), 1);
        assert_eq!(range.clamp(9), 5);
        assert!(range.contains(3));
        assert!(!range.contains(6));
    }
}
