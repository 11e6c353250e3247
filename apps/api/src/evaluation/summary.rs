//! Recommendation & Summary: the last classifier call. Turns the extracted
//! data and scores into strengths, concerns, a recommendation and a short
//! explanation.
//!
//! Stage states: Pending → Called → Parsed | Fallback. One call, no retry. A
//! failure here never blocks the numeric result; it yields a fallback record.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::evaluation::aggregator::Aggregate;
use crate::evaluation::models::{
    ExtractedFields, Recommendation, Summary, SummaryOutcome, SummaryStatus,
};
use crate::evaluation::prompts::{fill_template, SUMMARY_PROMPT};
use crate::evaluation::rubric::Rubric;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::structured::parse_structured;
use crate::llm_client::{classify_within, Classifier, PromptSpec};

const SUMMARY_MAX_TOKENS: u32 = 400;
/// Strengths and concerns are each kept to a short list.
pub const MAX_POINTS: usize = 3;

#[derive(Debug, Deserialize)]
struct SummaryRecord {
    pros: Vec<String>,
    cons: Vec<String>,
    recommendation: Recommendation,
    explanation: String,
}

pub fn build_summary_prompt(
    fields: &ExtractedFields,
    aggregate: &Aggregate,
    rubric: &Rubric,
) -> Result<PromptSpec, serde_json::Error> {
    let extracted_json = serde_json::to_string(fields)?;
    let scoring_json = serde_json::to_string(&aggregate.scoring)?;
    let missing_json = serde_json::to_string(&aggregate.missing_fields)?;
    let instruction = fill_template(
        SUMMARY_PROMPT,
        &[
            ("max_points", &MAX_POINTS.to_string()),
            ("threshold", &rubric.threshold.to_string()),
            ("max_score", &rubric.max_score().to_string()),
            ("extracted_json", &extracted_json),
            ("scoring_json", &scoring_json),
            ("total_score", &aggregate.total_score.to_string()),
            ("missing_json", &missing_json),
        ],
    );
    Ok(PromptSpec::new(instruction, SUMMARY_MAX_TOKENS).with_constraints(JSON_ONLY_SYSTEM))
}

/// Validates the classifier's record. Returns a reason on rejection.
pub fn parse_summary(raw: &str) -> Result<Summary, String> {
    let record: SummaryRecord = parse_structured(raw).map_err(|e| e.to_string())?;
    let explanation = record.explanation.trim().to_string();
    if explanation.is_empty() {
        return Err("summary explanation is empty".to_string());
    }
    Ok(Summary {
        pros: clean_points(record.pros),
        cons: clean_points(record.cons),
        recommendation: record.recommendation,
        explanation,
    })
}

fn clean_points(points: Vec<String>) -> Vec<String> {
    points
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_POINTS)
        .collect()
}

/// Reject-leaning record used whenever generation fails.
pub fn fallback_summary(reason: &str) -> Summary {
    Summary {
        pros: vec![],
        cons: vec![],
        recommendation: Recommendation::Reject,
        explanation: format!("Failed to generate summary: {reason}"),
    }
}

fn fallback(reason: &str) -> SummaryOutcome {
    warn!("summary generation fell back: {reason}");
    SummaryOutcome {
        summary: fallback_summary(reason),
        status: SummaryStatus::Fallback,
    }
}

pub async fn generate_summary(
    classifier: &dyn Classifier,
    fields: &ExtractedFields,
    aggregate: &Aggregate,
    rubric: &Rubric,
    call_timeout: Duration,
) -> SummaryOutcome {
    let spec = match build_summary_prompt(fields, aggregate, rubric) {
        Ok(spec) => spec,
        Err(e) => return fallback(&format!("could not serialize prompt inputs: {e}")),
    };

    info!("generating summary and recommendation");
    let raw = match classify_within(classifier, &spec, call_timeout).await {
        Ok(raw) => raw,
        Err(e) => return fallback(&e.to_string()),
    };
    debug!(raw = %raw, "summary answer");

    match parse_summary(&raw) {
        Ok(summary) => SummaryOutcome {
            summary,
            status: SummaryStatus::Parsed,
        },
        Err(reason) => fallback(&reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::models::ScoringResult;
    use crate::llm_client::stub::ScriptedClassifier;

    fn aggregate() -> Aggregate {
        let mut scoring = ScoringResult::default();
        scoring.insert("employment_status", 10);
        Aggregate {
            scoring,
            total_score: 10,
            missing_fields: vec!["current_company".to_string()],
        }
    }

    #[test]
    fn test_parse_summary_strips_fences_and_trims_lists() {
        let raw = r#"```json
{"pros": ["Strong title", " ", "Good school", "Stable", "Extra"],
 "cons": ["No previous companies"],
 "recommendation": "Accept",
 "explanation": " Solid candidate. Meets the bar. "}
```"#;
        let summary = parse_summary(raw).unwrap();
        assert_eq!(summary.pros, vec!["Strong title", "Good school", "Stable"]);
        assert_eq!(summary.cons.len(), 1);
        assert_eq!(summary.recommendation, Recommendation::Accept);
        assert_eq!(summary.explanation, "Solid candidate. Meets the bar.");
    }

    #[test]
    fn test_parse_summary_rejects_unknown_recommendation() {
        let raw = r#"{"pros": [], "cons": [], "recommendation": "Maybe", "explanation": "Hmm."}"#;
        assert!(parse_summary(raw).is_err());
    }

    #[test]
    fn test_parse_summary_rejects_missing_key() {
        let raw = r#"{"pros": [], "recommendation": "Reject", "explanation": "Hmm."}"#;
        assert!(parse_summary(raw).is_err());
    }

    #[test]
    fn test_parse_summary_rejects_blank_explanation() {
        let raw = r#"{"pros": [], "cons": [], "recommendation": "Reject", "explanation": "  "}"#;
        assert!(parse_summary(raw).is_err());
    }

    #[test]
    fn test_prompt_embeds_scores_and_missing_fields() {
        let spec = build_summary_prompt(&ExtractedFields::default(), &aggregate(), &Rubric::builtin()).unwrap();
        assert!(spec.instruction.contains("Total Score: 10"));
        assert!(spec.instruction.contains("[\"current_company\"]"));
        assert!(spec.instruction.contains("\"employment_status\":10"));
        assert!(spec.instruction.contains("65 points or more out of 80"));
    }

    #[test]
    fn test_prompt_keeps_placeholder_text_in_candidate_data() {
        let fields = ExtractedFields {
            full_name: Some("{missing_json} {total_score}".to_string()),
            ..ExtractedFields::default()
        };
        let spec = build_summary_prompt(&fields, &aggregate(), &Rubric::builtin()).unwrap();
        assert!(spec
            .instruction
            .contains("\"full_name\":\"{missing_json} {total_score}\""));
        assert!(spec.instruction.contains("Total Score: 10\n"));
        assert!(spec.instruction.ends_with("Missing Fields: [\"current_company\"]"));
    }

    #[tokio::test]
    async fn test_generate_summary_parsed() {
        let stub = ScriptedClassifier::new().on(
            "Total Score",
            r#"{"pros": ["Employed"], "cons": ["Missing company"], "recommendation": "Reject", "explanation": "Below the bar. Missing data."}"#,
        );
        let outcome = generate_summary(
            &stub,
            &ExtractedFields::default(),
            &aggregate(),
            &Rubric::builtin(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(outcome.status, SummaryStatus::Parsed);
        assert_eq!(outcome.summary.pros, vec!["Employed"]);
    }

    #[tokio::test]
    async fn test_generate_summary_falls_back_on_adapter_failure() {
        let stub = ScriptedClassifier::new();
        let outcome = generate_summary(
            &stub,
            &ExtractedFields::default(),
            &aggregate(),
            &Rubric::builtin(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(outcome.status, SummaryStatus::Fallback);
        assert_eq!(outcome.summary.recommendation, Recommendation::Reject);
        assert!(outcome.summary.pros.is_empty());
        assert!(outcome.summary.explanation.starts_with("Failed to generate summary"));
    }

    #[tokio::test]
    async fn test_generate_summary_falls_back_on_truncated_output() {
        let stub = ScriptedClassifier::new().on("Total Score", r#"{"pros": ["Employed"], "cons": ["#);
        let outcome = generate_summary(
            &stub,
            &ExtractedFields::default(),
            &aggregate(),
            &Rubric::builtin(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(outcome.status, SummaryStatus::Fallback);
        assert_eq!(stub.calls().len(), 1);
    }
}
