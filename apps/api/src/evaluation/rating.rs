//! Entity Rating: classifier-backed scores for open-ended names (job titles,
//! companies, places).
//!
//! Parsing is defensive: wrapped or truncated answers fall back to
//! `{name: <input>, rating: <range minimum>}` instead of failing the evaluation.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::evaluation::models::{EntityRating, EntityRatings, ExtractedFields};
use crate::evaluation::prompts::{
    fill_template, COMPANY_RATING_PROMPT, JOB_TITLE_TIER_PROMPT, LOCATION_RATING_PROMPT,
};
use crate::evaluation::rubric::{JobTitleTiers, ScoreRange, ScoringRules};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::structured::{parse_structured, sanitize};
use crate::llm_client::{classify_within, Classifier, PromptSpec};

const RATING_MAX_TOKENS: u32 = 50;
const TIER_MAX_TOKENS: u32 = 8;
/// In-flight rating calls allowed per evaluation unless configured otherwise.
pub const DEFAULT_RATING_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Company,
    Location,
}

impl EntityKind {
    fn label(self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Location => "location",
        }
    }

    pub fn prompt_spec(self, name: &str, range: ScoreRange) -> PromptSpec {
        let template = match self {
            EntityKind::Company => COMPANY_RATING_PROMPT,
            EntityKind::Location => LOCATION_RATING_PROMPT,
        };
        let (min, max) = (range.min.to_string(), range.max.to_string());
        let instruction = fill_template(template, &[("name", name), ("min", &min), ("max", &max)]);
        PromptSpec::new(instruction, RATING_MAX_TOKENS).with_constraints(JSON_ONLY_SYSTEM)
    }
}

/// Shape the classifier is asked for. Older prompts answered with `score`.
#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(alias = "score")]
    rating: f64,
}

/// Parses a `{name, rating}` answer. The returned name is always the input name
/// so every rating maps back to the entity it was asked about.
pub fn parse_rating(raw: &str, name: &str, range: ScoreRange) -> EntityRating {
    let rating = match parse_structured::<RatingRecord>(raw) {
        Ok(record) if record.rating.is_finite() => {
            let rounded = record.rating.round().max(0.0) as u32;
            if !range.contains(rounded) {
                warn!(
                    "rating {} for {name:?} outside {}-{}, clamping",
                    record.rating, range.min, range.max
                );
            }
            range.clamp(rounded)
        }
        Ok(record) => {
            warn!("non-finite rating {} for {name:?}, using minimum", record.rating);
            range.min
        }
        Err(e) => {
            warn!("unusable rating output for {name:?}, using minimum: {e}");
            range.min
        }
    };
    EntityRating {
        name: name.to_string(),
        rating,
    }
}

/// Rates one entity. Adapter failures fall back to the range minimum.
pub async fn rate_entity(
    classifier: &dyn Classifier,
    kind: EntityKind,
    name: &str,
    range: ScoreRange,
    call_timeout: Duration,
) -> EntityRating {
    let spec = kind.prompt_spec(name, range);
    match classify_within(classifier, &spec, call_timeout).await {
        Ok(raw) => {
            debug!(kind = kind.label(), name, raw = %raw, "rating answer");
            parse_rating(&raw, name, range)
        }
        Err(e) => {
            warn!(kind = kind.label(), "failed to rate {name:?}, using minimum: {e}");
            EntityRating {
                name: name.to_string(),
                rating: range.min,
            }
        }
    }
}

/// Rates every entry of a list field concurrently, holding one `limit` permit
/// per in-flight call. Output order matches input.
pub async fn rate_entities(
    classifier: Arc<dyn Classifier>,
    kind: EntityKind,
    names: &[String],
    range: ScoreRange,
    call_timeout: Duration,
    limit: Arc<Semaphore>,
) -> Vec<EntityRating> {
    let mut tasks = JoinSet::new();
    for (index, name) in names.iter().cloned().enumerate() {
        let classifier = Arc::clone(&classifier);
        let limit = Arc::clone(&limit);
        tasks.spawn(async move {
            // The semaphore is never closed, so a permit always arrives.
            let _permit = limit.acquire_owned().await.ok();
            let rating = rate_entity(classifier.as_ref(), kind, &name, range, call_timeout).await;
            (index, rating)
        });
    }

    let mut slots: Vec<Option<EntityRating>> = vec![None; names.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, rating)) => slots[index] = Some(rating),
            Err(e) => warn!(kind = kind.label(), "rating task aborted: {e}"),
        }
    }

    slots
        .into_iter()
        .zip(names)
        .map(|(slot, name)| {
            slot.unwrap_or_else(|| EntityRating {
                name: name.clone(),
                rating: range.min,
            })
        })
        .collect()
}

/// The list reducer: the best single rating, never a sum. Empty lists score 0.
pub fn best_rating(ratings: &[EntityRating]) -> u32 {
    ratings.iter().map(|r| r.rating).max().unwrap_or(0)
}

// ────────────────────────────────────────────────────────────────────────────
// Job title tier
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleTier {
    High,
    Mid,
    Low,
}

impl TitleTier {
    pub fn parse(raw: &str) -> Option<Self> {
        let label = sanitize(raw)
            .trim_matches(|c: char| !c.is_ascii_alphabetic())
            .to_ascii_uppercase();
        match label.as_str() {
            "HIGH" => Some(TitleTier::High),
            "MID" => Some(TitleTier::Mid),
            "LOW" => Some(TitleTier::Low),
            _ => None,
        }
    }

    pub fn points(self, tiers: &JobTitleTiers) -> u32 {
        match self {
            TitleTier::High => tiers.high,
            TitleTier::Mid => tiers.mid,
            TitleTier::Low => tiers.low,
        }
    }
}

/// Classifies a job title into a tier and returns its points. A missing title
/// scores 0 without a call; failures and unknown labels score the LOW tier.
pub async fn score_job_title(
    classifier: &dyn Classifier,
    title: Option<&str>,
    tiers: &JobTitleTiers,
    call_timeout: Duration,
) -> u32 {
    let Some(title) = title else {
        return 0;
    };
    let spec = PromptSpec::new(
        fill_template(JOB_TITLE_TIER_PROMPT, &[("title", title)]),
        TIER_MAX_TOKENS,
    );
    match classify_within(classifier, &spec, call_timeout).await {
        Ok(raw) => match TitleTier::parse(&raw) {
            Some(tier) => {
                debug!("job title {title:?} classified as {tier:?}");
                tier.points(tiers)
            }
            None => {
                warn!("unexpected job title tier {raw:?} for {title:?}, using LOW");
                tiers.low
            }
        },
        Err(e) => {
            warn!("failed to classify job title {title:?}, using LOW: {e}");
            tiers.low
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stage entry point
// ────────────────────────────────────────────────────────────────────────────

/// Rates every open-ended entity in `fields`. Independent groups run
/// concurrently; list entries share at most `max_concurrent` in-flight calls.
pub async fn rate_all(
    classifier: Arc<dyn Classifier>,
    fields: &ExtractedFields,
    rules: &ScoringRules,
    call_timeout: Duration,
    max_concurrent: usize,
) -> EntityRatings {
    let ranges = &rules.ratings;
    let limit = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let job_title = score_job_title(
        classifier.as_ref(),
        fields.current_job_title.as_deref(),
        &rules.job_title_tiers,
        call_timeout,
    );
    let current_company = async {
        match fields.current_company.as_deref() {
            Some(name) => Some(
                rate_entity(
                    classifier.as_ref(),
                    EntityKind::Company,
                    name,
                    ranges.current_company,
                    call_timeout,
                )
                .await,
            ),
            None => None,
        }
    };
    let current_location = async {
        match fields.current_location.as_deref() {
            Some(name) => Some(
                rate_entity(
                    classifier.as_ref(),
                    EntityKind::Location,
                    name,
                    ranges.location,
                    call_timeout,
                )
                .await,
            ),
            None => None,
        }
    };
    let previous_companies = rate_entities(
        Arc::clone(&classifier),
        EntityKind::Company,
        &fields.previous_companies,
        ranges.previous_company,
        call_timeout,
        Arc::clone(&limit),
    );
    let willing_to_work_in = rate_entities(
        Arc::clone(&classifier),
        EntityKind::Location,
        &fields.willing_to_work_in,
        ranges.location,
        call_timeout,
        limit,
    );

    let (current_job_title, current_company, current_location, previous_companies, willing_to_work_in) = tokio::join!(
        job_title,
        current_company,
        current_location,
        previous_companies,
        willing_to_work_in
    );

    info!(
        "entity rating complete: {} previous companies, {} willing-to-work locations",
        previous_companies.len(),
        willing_to_work_in.len()
    );

    EntityRatings {
        current_job_title,
        current_company,
        previous_companies,
        current_location,
        willing_to_work_in,
    }
}
