/*!
 * Error types for the syncsub application.
 *
 * Library errors are defined with the thiserror crate; the application glue
 * (controller, CLI) works with `anyhow::Result` and converts into `AppError`
 * where a typed error is needed.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Errors that can occur while translating a single text span
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The translator answered, but with nothing usable
    #[error("Empty translation returned for: {0}")]
    EmptyResponse(String),

    /// The translator cannot be used at all
    #[error("Translator unavailable: {0}")]
    Unavailable(String),
}

impl TranslationError {
    /// Whether another attempt could succeed; client errors and missing translators are final
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Provider(ProviderError::ApiError { status_code, .. }) => {
                *status_code >= 500 || *status_code == 429
            }
            TranslationError::Provider(ProviderError::ParseError(_)) => false,
            TranslationError::Provider(_) => true,
            TranslationError::EmptyResponse(_) => true,
            TranslationError::Unavailable(_) => false,
        }
    }
}

/// Fatal errors raised by the segmentation engine.
///
/// Recoverable conditions (soft-cap overflows, translation fallbacks) are not
/// errors; they are reported as warnings next to the generated cues.
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// Constraint parameters are out of range
    #[error("Invalid segmentation config: {0}")]
    InvalidConfig(String),

    /// The token stream breaks the ordering or interval contract
    #[error("Malformed token stream at token {token_index}: {reason}")]
    MalformedInput {
        /// Zero-based position of the offending token
        token_index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A segment could not be translated and the failure policy is `abort`
    #[error("Translation of segment {segment_index} failed: {source}")]
    TranslationAborted {
        /// Zero-based segment position
        segment_index: usize,
        /// Underlying translator error
        #[source]
        source: TranslationError,
    },

    /// The assembled cue list breaks an ordering invariant (engine bug)
    #[error("Cue invariant violated at cue {cue_index}: {reason}")]
    InvariantViolation {
        /// One-based cue index
        cue_index: usize,
        /// Which invariant failed
        reason: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// ffmpeg could not produce the audio track
    #[error("Audio extraction error: {0}")]
    AudioExtraction(String),

    /// The transcription collaborator failed or produced unusable output
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the segmentation engine
    #[error("Segmentation error: {0}")]
    Segmentation(#[from] SegmentationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
