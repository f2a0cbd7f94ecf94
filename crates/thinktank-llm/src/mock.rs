//! Mock LLM provider for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// How the mock answers
#[derive(Debug)]
enum Behaviour {
    /// Cycle through canned responses
    Scripted(Vec<String>),
    /// Answer from the shape of the request
    Smart,
    /// Fail every call
    Failing,
}

/// A mock LLM provider that returns predefined responses.
///
/// Counts calls and records every request so tests can assert on exactly
/// what the gateway sent.
#[derive(Debug)]
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    behaviour: Behaviour,
    /// Number of `complete` calls so far
    calls: AtomicUsize,
    /// Requests seen, in call order
    requests: Mutex<Vec<LlmRequest>>,
    /// Simulated latency in ms
    latency_ms: u64,
}

impl MockProvider {
    fn with_behaviour(behaviour: Behaviour) -> Self {
        Self {
            name: "mock".to_string(),
            behaviour,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            latency_ms: 0,
        }
    }

    /// Create a new mock provider with given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_behaviour(Behaviour::Scripted(responses))
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock whose every call fails with a connection error
    pub fn failing() -> Self {
        Self::with_behaviour(Behaviour::Failing)
    }

    /// Create a smart mock that responds based on request content
    pub fn smart() -> Self {
        let mut mock = Self::with_behaviour(Behaviour::Smart);
        mock.name = "smart-mock".to_string();
        mock
    }

    /// Simulate network latency on every call
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the requests received so far
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }

    fn generate_smart_response(request: &LlmRequest) -> String {
        let system_lower = request.system.to_lowercase();

        if system_lower.contains("summar") {
            return "Summary: Both sides argued with conviction. They agreed that the question \
                    matters and disagreed on its answer. The winner is the side whose arguments \
                    engaged most directly with the others."
                .to_string();
        }

        if system_lower.contains("moderator") {
            return "Welcome, everyone. Let us hear the arguments with open minds.".to_string();
        }

        let speaker = request
            .system
            .strip_prefix("You are ")
            .and_then(|rest| rest.split(',').next())
            .unwrap_or("The speaker");

        format!(
            "{} considers the question carefully. Having heard {} earlier argument(s), \
             the position offered here is that the matter deserves closer examination.",
            speaker,
            request.history.len().saturating_sub(1)
        )
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        !matches!(self.behaviour, Behaviour::Failing)
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        let content = match &self.behaviour {
            Behaviour::Failing => {
                return Err(LlmError::ConnectionFailed(format!(
                    "{} is configured to fail",
                    self.name
                )))
            }
            Behaviour::Scripted(responses) if responses.is_empty() => String::new(),
            Behaviour::Scripted(responses) => responses[idx % responses.len()].clone(),
            Behaviour::Smart => Self::generate_smart_response(&request),
        };

        Ok(LlmResponse {
            content,
            model: request.config.model.clone(),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
