//! Field Extraction: one classifier call per resume-derived field, fanned out
//! concurrently, then normalised and merged with the user-declared fields.
//!
//! Every field is independent: an adapter failure, a timeout or unparseable
//! output leaves that one field null (or empty, for lists) and never touches the
//! others.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::evaluation::models::{ExtractedFields, ExtractionRequest};
use crate::evaluation::prompts::{
    fill_template, CURRENT_COMPANY_PROMPT, CURRENT_LOCATION_PROMPT, EDUCATION_PROMPT,
    EMPLOYMENT_STATUS_PROMPT, FULL_NAME_PROMPT, JOB_TITLE_PROMPT, PREVIOUS_COMPANIES_PROMPT,
    YEARS_OF_EXPERIENCE_PROMPT,
};
use crate::llm_client::prompts::{BARE_VALUE_SYSTEM, JSON_ONLY_SYSTEM};
use crate::llm_client::structured::{parse_structured, sanitize};
use crate::llm_client::{classify_within, Classifier, PromptSpec};

/// Output budget for a single bare value.
const VALUE_MAX_TOKENS: u32 = 100;
/// Company lists can run long on senior resumes.
const LIST_MAX_TOKENS: u32 = 300;

/// Fields read out of the resume text by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResumeField {
    FullName,
    EmploymentStatus,
    HighestEducationLevel,
    CurrentJobTitle,
    YearsOfExperience,
    CurrentCompany,
    PreviousCompanies,
    CurrentLocation,
}

impl ResumeField {
    pub const ALL: [ResumeField; 8] = [
        ResumeField::FullName,
        ResumeField::EmploymentStatus,
        ResumeField::HighestEducationLevel,
        ResumeField::CurrentJobTitle,
        ResumeField::YearsOfExperience,
        ResumeField::CurrentCompany,
        ResumeField::PreviousCompanies,
        ResumeField::CurrentLocation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ResumeField::FullName => "full_name",
            ResumeField::EmploymentStatus => "employment_status",
            ResumeField::HighestEducationLevel => "highest_education_level",
            ResumeField::CurrentJobTitle => "current_job_title",
            ResumeField::YearsOfExperience => "years_of_experience",
            ResumeField::CurrentCompany => "current_company",
            ResumeField::PreviousCompanies => "previous_companies",
            ResumeField::CurrentLocation => "current_location",
        }
    }

    fn template(self) -> &'static str {
        match self {
            ResumeField::FullName => FULL_NAME_PROMPT,
            ResumeField::EmploymentStatus => EMPLOYMENT_STATUS_PROMPT,
            ResumeField::HighestEducationLevel => EDUCATION_PROMPT,
            ResumeField::CurrentJobTitle => JOB_TITLE_PROMPT,
            ResumeField::YearsOfExperience => YEARS_OF_EXPERIENCE_PROMPT,
            ResumeField::CurrentCompany => CURRENT_COMPANY_PROMPT,
            ResumeField::PreviousCompanies => PREVIOUS_COMPANIES_PROMPT,
            ResumeField::CurrentLocation => CURRENT_LOCATION_PROMPT,
        }
    }

    pub fn prompt_spec(self, resume_text: &str) -> PromptSpec {
        let instruction = fill_template(self.template(), &[("resume_text", resume_text)]);
        match self {
            ResumeField::PreviousCompanies => {
                PromptSpec::new(instruction, LIST_MAX_TOKENS).with_constraints(JSON_ONLY_SYSTEM)
            }
            _ => PromptSpec::new(instruction, VALUE_MAX_TOKENS).with_constraints(BARE_VALUE_SYSTEM),
        }
    }

    /// Writes the normalised classifier answer into `fields`.
    fn apply(self, fields: &mut ExtractedFields, raw: &str) {
        match self {
            ResumeField::FullName => fields.full_name = normalize_text(raw),
            ResumeField::EmploymentStatus => fields.employment_status = normalize_text(raw),
            ResumeField::HighestEducationLevel => {
                fields.highest_education_level = normalize_text(raw)
            }
            ResumeField::CurrentJobTitle => fields.current_job_title = normalize_text(raw),
            ResumeField::YearsOfExperience => fields.years_of_experience = normalize_years(raw),
            ResumeField::CurrentCompany => fields.current_company = normalize_text(raw),
            ResumeField::PreviousCompanies => fields.previous_companies = normalize_list(raw),
            ResumeField::CurrentLocation => fields.current_location = normalize_text(raw),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalisation
// ────────────────────────────────────────────────────────────────────────────

/// The literal `null` (case-sensitive) or a blank answer means "not found".
pub fn normalize_text(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() || text == "null" {
        None
    } else {
        Some(text.to_string())
    }
}

/// Numeric answers only; anything else is null. Never fails.
pub fn normalize_years(raw: &str) -> Option<f64> {
    normalize_text(raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// A JSON array of names. Malformed output becomes an empty list, never null.
pub fn normalize_list(raw: &str) -> Vec<String> {
    if sanitize(raw) == "[]" {
        return Vec::new();
    }
    match parse_structured::<Vec<String>>(raw) {
        Ok(names) => names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && n != "null")
            .collect(),
        Err(e) => {
            warn!("previous companies output unusable, treating as empty: {e}");
            Vec::new()
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration
// ────────────────────────────────────────────────────────────────────────────

/// Extracts every resume-derived field concurrently, then merges the
/// user-declared fields. Returns only after every call has finished or failed.
pub async fn extract_fields(
    classifier: Arc<dyn Classifier>,
    request: &ExtractionRequest,
    call_timeout: Duration,
) -> ExtractedFields {
    let resume_text: Arc<str> = Arc::from(request.resume_text.as_str());
    let mut tasks = JoinSet::new();

    for field in ResumeField::ALL {
        let classifier = Arc::clone(&classifier);
        let resume_text = Arc::clone(&resume_text);
        tasks.spawn(async move {
            let spec = field.prompt_spec(&resume_text);
            let answer = classify_within(classifier.as_ref(), &spec, call_timeout).await;
            (field, answer)
        });
    }

    let mut fields = ExtractedFields::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((field, Ok(raw))) => {
                debug!(field = field.key(), raw = %raw, "extraction answer");
                field.apply(&mut fields, &raw);
            }
            Ok((field, Err(e))) => {
                warn!(field = field.key(), "extraction failed, leaving field empty: {e}");
            }
            Err(e) => {
                warn!("extraction task aborted, its field stays empty: {e}");
            }
        }
    }

    merge_declared_fields(&mut fields, request);

    let found = fields.presence().iter().filter(|(_, present)| *present).count();
    info!("extraction complete: {found}/{} fields present", fields.presence().len());
    fields
}

/// Copies the user-declared fields verbatim.
fn merge_declared_fields(fields: &mut ExtractedFields, request: &ExtractionRequest) {
    fields.desired_compensation = request.desired_compensation;
    fields.willing_to_work_in = request.locations_willing_to_work.clone();
    fields.visa_sponsorship_required = request.visa_sponsorship_required;
}
