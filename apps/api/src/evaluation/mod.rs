//! Resume screening: field extraction, rubric scoring, entity rating and the
//! final recommendation, composed by `pipeline::Pipeline`.

pub mod aggregator;
pub mod assembler;
pub mod extraction;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod rating;
pub mod rubric;
pub mod scorer;
pub mod summary;

pub use pipeline::{EvaluationError, Pipeline};
