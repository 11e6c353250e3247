//! Deterministic Scorer: pure, total functions from an extracted value to
//! rubric points. No classifier calls; anything unscoreable is 0.
//!
//! These fields have a small, enumerable domain, so hand-coded rules keep them
//! auditable and reproducible.

use crate::evaluation::models::{ExtractedFields, VisaRequirement};
use crate::evaluation::rubric::{
    CompensationRule, EducationTier, EmploymentRule, ExperienceRule, ScoringRules,
    DESIRED_COMPENSATION, EMPLOYMENT_STATUS, HIGHEST_EDUCATION_LEVEL, VISA_SPONSORSHIP,
    YEARS_OF_EXPERIENCE,
};

pub fn score_employment_status(status: Option<&str>, rule: &EmploymentRule) -> u32 {
    match status {
        Some("Employed") => rule.employed,
        Some("Unemployed") => rule.unemployed,
        _ => 0,
    }
}

/// First tier (in order) with a keyword contained in the level wins.
pub fn score_education(level: Option<&str>, tiers: &[EducationTier]) -> u32 {
    let Some(level) = level else {
        return 0;
    };
    let level = level.to_lowercase();
    tiers
        .iter()
        .find(|tier| {
            tier.keywords
                .iter()
                .any(|k| level.contains(&k.to_lowercase()))
        })
        .map(|tier| tier.points)
        .unwrap_or(0)
}

pub fn score_years_of_experience(years: Option<f64>, rule: &ExperienceRule) -> u32 {
    match years {
        Some(y) if (rule.sweet_spot_min_years..=rule.sweet_spot_max_years).contains(&y) => {
            rule.sweet_spot_points
        }
        Some(y) if (0.0..=rule.junior_max_years).contains(&y) => rule.junior_points,
        _ => 0,
    }
}

pub fn score_visa(visa: Option<VisaRequirement>, not_required_points: u32) -> u32 {
    match visa {
        Some(VisaRequirement::No) => not_required_points,
        _ => 0,
    }
}

pub fn score_compensation(compensation: Option<u64>, rule: &CompensationRule) -> u32 {
    match compensation {
        Some(c) if c < rule.low_threshold => 0,
        Some(c) if c <= rule.mid_ceiling => rule.mid_points,
        Some(_) => rule.high_points,
        None => 0,
    }
}

/// Scores every deterministic component, keyed by rubric key.
pub fn score_deterministic(fields: &ExtractedFields, rules: &ScoringRules) -> Vec<(&'static str, u32)> {
    vec![
        (
            EMPLOYMENT_STATUS,
            score_employment_status(fields.employment_status.as_deref(), &rules.employment),
        ),
        (
            HIGHEST_EDUCATION_LEVEL,
            score_education(fields.highest_education_level.as_deref(), &rules.education_tiers),
        ),
        (
            YEARS_OF_EXPERIENCE,
            score_years_of_experience(fields.years_of_experience, &rules.experience),
        ),
        (
            VISA_SPONSORSHIP,
            score_visa(fields.visa_sponsorship_required, rules.visa_not_required_points),
        ),
        (
            DESIRED_COMPENSATION,
            score_compensation(fields.desired_compensation, &rules.compensation),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScoringRules {
        ScoringRules::default()
    }

    #[test]
    fn test_employment_status() {
        let r = rules();
        assert_eq!(score_employment_status(Some("Employed"), &r.employment), 10);
        assert_eq!(score_employment_status(Some("Unemployed"), &r.employment), 6);
        assert_eq!(score_employment_status(Some("Freelance"), &r.employment), 0);
        assert_eq!(score_employment_status(None, &r.employment), 0);
    }

    #[test]
    fn test_education_tiers() {
        let r = rules();
        assert_eq!(score_education(Some("PhD"), &r.education_tiers), 10);
        assert_eq!(score_education(Some("Doctorate"), &r.education_tiers), 10);
        assert_eq!(score_education(Some("Master of Science"), &r.education_tiers), 10);
        assert_eq!(score_education(Some("Bachelor"), &r.education_tiers), 9);
        assert_eq!(score_education(Some("Associate"), &r.education_tiers), 0);
        assert_eq!(score_education(None, &r.education_tiers), 0);
    }

    #[test]
    fn test_years_of_experience_bands() {
        let r = rules();
        assert_eq!(score_years_of_experience(None, &r.experience), 0);
        assert_eq!(score_years_of_experience(Some(0.0), &r.experience), 2);
        assert_eq!(score_years_of_experience(Some(2.0), &r.experience), 2);
        assert_eq!(score_years_of_experience(Some(2.5), &r.experience), 0);
        assert_eq!(score_years_of_experience(Some(3.0), &r.experience), 10);
        assert_eq!(score_years_of_experience(Some(15.0), &r.experience), 10);
        assert_eq!(score_years_of_experience(Some(16.0), &r.experience), 0);
        assert_eq!(score_years_of_experience(Some(-1.0), &r.experience), 0);
    }

    #[test]
    fn test_visa() {
        assert_eq!(score_visa(Some(VisaRequirement::No), 10), 10);
        assert_eq!(score_visa(Some(VisaRequirement::Yes), 10), 0);
        assert_eq!(score_visa(None, 10), 0);
    }

    #[test]
    fn test_compensation_bands() {
        let r = rules();
        assert_eq!(score_compensation(None, &r.compensation), 0);
        assert_eq!(score_compensation(Some(99_999), &r.compensation), 0);
        assert_eq!(score_compensation(Some(100_000), &r.compensation), 8);
        assert_eq!(score_compensation(Some(140_000), &r.compensation), 8);
        assert_eq!(score_compensation(Some(140_001), &r.compensation), 10);
    }

    #[test]
    fn test_score_deterministic_is_idempotent() {
        let fields = ExtractedFields {
            employment_status: Some("Employed".to_string()),
            highest_education_level: Some("Bachelor".to_string()),
            years_of_experience: Some(5.0),
            desired_compensation: Some(120_000),
            visa_sponsorship_required: Some(VisaRequirement::No),
            ..Default::default()
        };
        let first = score_deterministic(&fields, &rules());
        let second = score_deterministic(&fields, &rules());
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                (EMPLOYMENT_STATUS, 10),
                (HIGHEST_EDUCATION_LEVEL, 9),
                (YEARS_OF_EXPERIENCE, 10),
                (VISA_SPONSORSHIP, 10),
                (DESIRED_COMPENSATION, 8),
            ]
        );
    }
}
