/*!
 * Clients for translation model backends.
 *
 * - `ollama`: HTTP client for a local or remote Ollama server
 * - `mock`: scripted backend for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for model backends
///
/// Each backend has its own request and response shapes; callers build the
/// request, complete it, and pull the generated text back out.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Check that the backend is reachable
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract the generated text from a response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod mock;
pub mod ollama;
