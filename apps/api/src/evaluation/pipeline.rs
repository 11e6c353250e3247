//! Evaluation pipeline. Stages run in dependency order:
//!
//! extract_fields → rate_all → aggregate → generate_summary → assemble
//!
//! Extraction and rating fan out concurrently inside their stages; both are
//! fully joined before aggregation. The summary call always runs last.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::aggregator::aggregate;
use crate::evaluation::assembler::assemble;
use crate::evaluation::extraction::extract_fields;
use crate::evaluation::models::{EvaluationOutcome, ExtractionRequest};
use crate::evaluation::rating::{rate_all, DEFAULT_RATING_CONCURRENCY};
use crate::evaluation::rubric::Rubric;
use crate::evaluation::summary::generate_summary;
use crate::llm_client::Classifier;

/// Errors that abort a whole evaluation. Everything else degrades in place.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("resume text is empty")]
    EmptyResume,
}

impl From<EvaluationError> for AppError {
    fn from(e: EvaluationError) -> Self {
        AppError::UnprocessableEntity(e.to_string())
    }
}

/// Request-scoped evaluation runner. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<dyn Classifier>,
    rubric: Arc<Rubric>,
    call_timeout: Duration,
    rating_concurrency: usize,
}

impl Pipeline {
    pub fn new(classifier: Arc<dyn Classifier>, rubric: Arc<Rubric>, call_timeout: Duration) -> Self {
        Self {
            classifier,
            rubric,
            call_timeout,
            rating_concurrency: DEFAULT_RATING_CONCURRENCY,
        }
    }

    /// Caps in-flight entity rating calls per evaluation.
    pub fn with_rating_concurrency(mut self, max_concurrent: usize) -> Self {
        self.rating_concurrency = max_concurrent.max(1);
        self
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub async fn evaluate(&self, request: ExtractionRequest) -> Result<EvaluationOutcome, EvaluationError> {
        if request.resume_text.trim().is_empty() {
            return Err(EvaluationError::EmptyResume);
        }
        let evaluation_id = Uuid::new_v4();
        let span = tracing::info_span!("evaluation", %evaluation_id, rubric = %self.rubric.version);
        self.run(evaluation_id, request).instrument(span).await
    }

    async fn run(&self, evaluation_id: Uuid, request: ExtractionRequest) -> Result<EvaluationOutcome, EvaluationError> {
        info!("starting evaluation ({} chars of resume text)", request.resume_text.len());

        let fields = extract_fields(Arc::clone(&self.classifier), &request, self.call_timeout).await;
        let ratings = rate_all(
            Arc::clone(&self.classifier),
            &fields,
            &self.rubric.rules,
            self.call_timeout,
            self.rating_concurrency,
        )
        .await;

        let aggregate = aggregate(&fields, &ratings, &self.rubric);
        info!(
            "total score {}/{} over {} components with {} missing fields",
            aggregate.total_score,
            self.rubric.max_score(),
            aggregate.scoring.len(),
            aggregate.missing_fields.len()
        );

        let summary = generate_summary(
            self.classifier.as_ref(),
            &fields,
            &aggregate,
            &self.rubric,
            self.call_timeout,
        )
        .await;

        let outcome = assemble(evaluation_id, fields, ratings, aggregate, summary, &self.rubric);
        info!("evaluation complete: {:?}", outcome.recommendation);
        Ok(outcome)
    }
}
