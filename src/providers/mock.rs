/*!
 * Mock provider for testing.
 *
 * Simulates backend behaviours without a network:
 * - `MockProvider::working()` - always succeeds
 * - `MockProvider::intermittent(n)` - every nth request fails
 * - `MockProvider::failing()` - always fails
 * - `MockProvider::empty()` - answers with empty text
 *
 * `with_custom_response` and `with_delay` script replies and timing per request.
 * It implements both `Provider` and `Translator`, so it can be plugged straight
 * into a `BatchTranslator`. Clones share the request counter.
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::{ProviderError, TranslationError};
use crate::providers::Provider;
use crate::translation::Translator;

/// One segment as the scripted backend sees it
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

/// Scripted reply
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub text: String,
}

/// How the scripted backend answers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails every Nth request (1-based)
    Intermittent { fail_every: usize },
    /// Always fails with a server error
    Failing,
    /// Fails with a non-retryable client error
    Rejecting,
    /// Returns empty text
    Empty,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Scripted translation backend; clones share one request counter
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    responder: Option<fn(&MockRequest) -> String>,
    delay: Option<fn(&MockRequest) -> u64>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            responder: None,
            delay: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Replace the default `[target] text` reply of successful requests
    pub fn with_custom_response(mut self, responder: fn(&MockRequest) -> String) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Hold each request for a per-request number of milliseconds before answering
    pub fn with_delay(mut self, delay: fn(&MockRequest) -> u64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received so far (shared between clones)
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn success_text(&self, request: &MockRequest) -> String {
        match self.responder {
            Some(respond) => respond(request),
            None => format!("[{}] {}", request.target_language, request.text),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let seen = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(Duration::from_millis(delay(&request))).await;
        }

        match self.behavior {
            MockBehavior::Working => Ok(MockResponse {
                text: self.success_text(&request),
            }),

            MockBehavior::Intermittent { fail_every } => {
                if (seen + 1) % fail_every == 0 {
                    Err(ProviderError::ApiError {
                        message: format!("scripted outage on request {}", seen + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(MockResponse {
                        text: self.success_text(&request),
                    })
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "scripted server error".to_string(),
                status_code: 500,
            }),

            MockBehavior::Rejecting => Err(ProviderError::ApiError {
                message: "scripted rejection".to_string(),
                status_code: 400,
            }),

            MockBehavior::Empty => Ok(MockResponse { text: String::new() }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(MockResponse {
                    text: self.success_text(&request),
                })
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("scripted backend unreachable".to_string())),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}

#[async_trait]
impl Translator for MockProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let request = MockRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<(), TranslationError> {
        self.test_connection().await.map_err(TranslationError::from)
    }
}
