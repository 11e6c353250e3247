use crate::config::Config;
use crate::evaluation::Pipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Evaluation runner holding the classifier and the active rubric.
    pub pipeline: Pipeline,
    pub config: Config,
}
