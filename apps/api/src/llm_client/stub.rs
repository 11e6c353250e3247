//! Scripted in-memory classifier for tests. Rules match on a substring of the
//! instruction; the first matching rule answers. Unmatched prompts fail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{Classifier, ClassifierError, PromptSpec};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

#[derive(Default)]
pub struct ScriptedClassifier {
    rules: Vec<(String, Reply)>,
    delay: Option<Duration>,
    calls: Mutex<Vec<PromptSpec>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, answer: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Text(answer.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<PromptSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of `classify` calls observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, spec: &PromptSpec) -> Result<String, ClassifierError> {
        self.calls.lock().unwrap().push(spec.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| spec.instruction.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Fail);
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail => Err(ClassifierError::Api {
                status: 503,
                message: "scripted failure".to_string(),
            }),
        }
    }
}
