use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::document::{extract_pdf_text, is_pdf};
use crate::errors::AppError;
use crate::evaluation::models::{
    check_locations, parse_compensation, split_locations, EvaluationOutcome, ExtractionRequest,
    VisaRequirement,
};
use crate::state::AppState;

/// Compensation may arrive as a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CompensationInput {
    Number(f64),
    Text(String),
}

/// Locations may arrive as an array or a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LocationsInput {
    List(Vec<String>),
    Csv(String),
}

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    pub resume_text: String,
    pub desired_compensation: Option<CompensationInput>,
    pub locations_willing_to_work: Option<LocationsInput>,
    pub visa_sponsorship_required: Option<String>,
}

impl TryFrom<EvaluationRequest> for ExtractionRequest {
    type Error = AppError;

    fn try_from(req: EvaluationRequest) -> Result<Self, Self::Error> {
        let desired_compensation = match req.desired_compensation {
            Some(CompensationInput::Number(n)) => parse_compensation(&n.to_string())?,
            Some(CompensationInput::Text(s)) => parse_compensation(&s)?,
            None => None,
        };
        let locations_willing_to_work = match req.locations_willing_to_work {
            Some(LocationsInput::List(list)) => list
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Some(LocationsInput::Csv(csv)) => split_locations(&csv),
            None => Vec::new(),
        };
        let visa_sponsorship_required = match req.visa_sponsorship_required.as_deref() {
            Some(raw) => VisaRequirement::parse(raw)?,
            None => None,
        };
        Ok(ExtractionRequest {
            resume_text: req.resume_text,
            desired_compensation,
            locations_willing_to_work: check_locations(locations_willing_to_work)?,
            visa_sponsorship_required,
        })
    }
}

/// POST /api/v1/evaluations
pub async fn handle_evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Json<EvaluationOutcome>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    if req.resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text is required".to_string()));
    }
    let request = ExtractionRequest::try_from(req)?;
    let outcome = state.pipeline.evaluate(request).await?;
    Ok(Json(outcome))
}

/// POST /api/analyze-resume
///
/// Multipart form: `resume` (PDF), `desiredCompensation`,
/// `locationsWillingToWork` (comma-separated), `visaSponsorshipRequired`.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EvaluationOutcome>, AppError> {
    let mut resume: Option<Bytes> = None;
    let mut compensation: Option<String> = None;
    let mut locations: Option<String> = None;
    let mut visa: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read resume upload: {e}")))?;
                if !is_pdf(content_type.as_deref(), &data) {
                    return Err(AppError::Validation("resume must be a PDF file".to_string()));
                }
                resume = Some(data);
            }
            "desiredCompensation" => compensation = Some(read_text(field).await?),
            "locationsWillingToWork" => locations = Some(read_text(field).await?),
            "visaSponsorshipRequired" => visa = Some(read_text(field).await?),
            _ => {}
        }
    }

    let resume = resume.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    info!("received resume upload ({} bytes)", resume.len());
    let resume_text = extract_pdf_text(resume).await?;

    let request = ExtractionRequest::from_form(
        resume_text,
        compensation.as_deref(),
        locations.as_deref(),
        visa.as_deref(),
    )?;
    let outcome = state.pipeline.evaluate(request).await?;
    Ok(Json(outcome))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("invalid form field: {e}")))
}
