//! Result Assembler: pure composition of every stage's output into the single
//! `EvaluationOutcome`. The final recommendation is the rubric rule, not the
//! classifier's opinion.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::evaluation::aggregator::Aggregate;
use crate::evaluation::models::{
    AssembledFields, EntityRatings, EvaluationOutcome, ExtractedFields, Recommendation,
    SummaryOutcome, SummaryStatus,
};
use crate::evaluation::rubric::Rubric;

/// Accept iff the total reaches the threshold and no critical field is missing.
pub fn decide_recommendation(total_score: u32, missing_fields: &[String], rubric: &Rubric) -> Recommendation {
    let critical_missing = rubric
        .critical_fields
        .iter()
        .any(|critical| missing_fields.contains(critical));
    if total_score >= rubric.threshold && !critical_missing {
        Recommendation::Accept
    } else {
        Recommendation::Reject
    }
}

/// Substitutes rating records for raw entity names.
fn assemble_fields(fields: ExtractedFields, ratings: EntityRatings) -> AssembledFields {
    AssembledFields {
        full_name: fields.full_name,
        employment_status: fields.employment_status,
        highest_education_level: fields.highest_education_level,
        current_job_title: fields.current_job_title,
        years_of_experience: fields.years_of_experience,
        current_company: ratings.current_company,
        previous_companies: ratings.previous_companies,
        current_location: ratings.current_location,
        desired_compensation: fields.desired_compensation,
        willing_to_work_in: ratings.willing_to_work_in,
        visa_sponsorship_required: fields.visa_sponsorship_required,
    }
}

pub fn assemble(
    evaluation_id: Uuid,
    fields: ExtractedFields,
    ratings: EntityRatings,
    aggregate: Aggregate,
    summary: SummaryOutcome,
    rubric: &Rubric,
) -> EvaluationOutcome {
    let recommendation = decide_recommendation(aggregate.total_score, &aggregate.missing_fields, rubric);
    if summary.status == SummaryStatus::Parsed && summary.summary.recommendation != recommendation {
        warn!(
            "summary suggested {:?} but rubric decides {:?} (total {}, threshold {})",
            summary.summary.recommendation, recommendation, aggregate.total_score, rubric.threshold
        );
    }

    EvaluationOutcome {
        evaluation_id,
        evaluated_at: Utc::now(),
        rubric_version: rubric.version.clone(),
        extracted_fields: assemble_fields(fields, ratings),
        scoring: aggregate.scoring,
        total_score: aggregate.total_score,
        max_score: rubric.max_score(),
        threshold: rubric.threshold,
        missing_fields: aggregate.missing_fields,
        pros: summary.summary.pros,
        cons: summary.summary.cons,
        recommendation,
        explanation: summary.summary.explanation,
        summary_status: summary.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::models::{EntityRating, ScoringResult, Summary};

    fn missing(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_exactly_at_threshold_accepts() {
        let rubric = Rubric::builtin();
        assert_eq!(decide_recommendation(65, &[], &rubric), Recommendation::Accept);
    }

    #[test]
    fn test_below_threshold_rejects() {
        let rubric = Rubric::builtin();
        assert_eq!(decide_recommendation(64, &[], &rubric), Recommendation::Reject);
    }

    #[test]
    fn test_missing_critical_field_rejects_despite_score() {
        let rubric = Rubric::builtin();
        assert_eq!(
            decide_recommendation(80, &missing(&["years_of_experience"]), &rubric),
            Recommendation::Reject
        );
    }

    #[test]
    fn test_missing_non_critical_field_still_accepts() {
        let rubric = Rubric::builtin();
        assert_eq!(
            decide_recommendation(70, &missing(&["full_name", "previous_companies"]), &rubric),
            Recommendation::Accept
        );
    }

    #[test]
    fn test_assemble_substitutes_ratings_and_overrides_recommendation() {
        let rubric = Rubric::builtin();
        let fields = ExtractedFields {
            full_name: Some("Jane Doe".into()),
            current_company: Some("Stripe".into()),
            ..Default::default()
        };
        let ratings = EntityRatings {
            current_company: Some(EntityRating {
                name: "Stripe".into(),
                rating: 5,
            }),
            ..Default::default()
        };
        let mut scoring = ScoringResult::default();
        scoring.insert("current_company", 5);
        let aggregate = Aggregate {
            scoring,
            total_score: 5,
            missing_fields: missing(&["current_job_title"]),
        };
        let summary = SummaryOutcome {
            summary: Summary {
                pros: vec!["Known company".into()],
                cons: vec![],
                recommendation: Recommendation::Accept,
                explanation: "Looks good.".into(),
            },
            status: SummaryStatus::Parsed,
        };

        let outcome = assemble(Uuid::new_v4(), fields, ratings, aggregate, summary, &rubric);

        assert_eq!(outcome.recommendation, Recommendation::Reject);
        assert_eq!(outcome.pros, vec!["Known company"]);
        assert_eq!(outcome.max_score, 80);
        assert_eq!(outcome.extracted_fields.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(outcome.extracted_fields.current_company.as_ref().map(|c| c.rating), Some(5));

        let json = serde_json::to_value(&outcome).unwrap();
        for key in ["extracted_fields", "scoring", "total_score", "missing_fields", "pros", "cons", "recommendation", "explanation"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["extracted_fields"]["current_company"]["name"], "Stripe");
        assert_eq!(json["recommendation"], "Reject");
        assert_eq!(json["summary_status"], "parsed");
    }
}
