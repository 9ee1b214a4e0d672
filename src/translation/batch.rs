/*!
 * Concurrent per-segment translation.
 *
 * Every segment is one work item. Items run on a bounded pool (semaphore plus
 * `buffer_unordered`), results are collected as `(segment_index, result)` and
 * sorted back into segment order before anything is written, so completion
 * order never leaks into the output.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::errors::{SegmentationError, TranslationError};
use crate::segmentation::{ConstraintWarning, Segment, WarningKind};

use super::cache::{TranslationCache, truncate_text};
use super::core::{FailurePolicy, PassthroughTranslator, Translator};

/// Tuning for a `BatchTranslator`
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum number of segments translated at once
    pub concurrent_requests: usize,

    /// What to do with a segment that keeps failing
    pub failure_policy: FailurePolicy,

    /// Extra attempts after the first failure
    pub retry_count: u32,

    /// Delay before the first retry, doubled for each further one
    pub retry_backoff_ms: u64,

    /// Whether identical texts reuse a previous translation
    pub cache_enabled: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrent_requests: 4,
            failure_policy: FailurePolicy::Fallback,
            retry_count: 3,
            retry_backoff_ms: 1000,
            cache_enabled: true,
        }
    }
}

/// Translates segments through a bounded worker pool
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    translator: Arc<dyn Translator>,
    source_language: String,
    target_language: String,
    options: BatchOptions,
    semaphore: Arc<Semaphore>,
    cache: TranslationCache,
}

impl BatchTranslator {
    /// Create a batch translator for one language pair
    pub fn new(
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        options: BatchOptions,
    ) -> Self {
        let options = BatchOptions {
            concurrent_requests: options.concurrent_requests.max(1),
            ..options
        };
        Self {
            translator,
            source_language: source_language.into(),
            target_language: target_language.into(),
            semaphore: Arc::new(Semaphore::new(options.concurrent_requests)),
            cache: TranslationCache::new(options.cache_enabled),
            options,
        }
    }

    /// A translator that keeps the source text; used for source-language subtitles
    pub fn passthrough(language: impl Into<String>) -> Self {
        let language = language.into();
        Self::new(
            Arc::new(PassthroughTranslator),
            language.clone(),
            language,
            BatchOptions {
                retry_count: 0,
                cache_enabled: false,
                ..BatchOptions::default()
            },
        )
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Name of the wrapped backend
    pub fn translator_name(&self) -> &str {
        self.translator.name()
    }

    /// Ask the wrapped backend whether it is reachable
    pub async fn health_check(&self) -> Result<(), TranslationError> {
        self.translator.health_check().await
    }

    /// Translate every segment once and store the result in `translated_text`
    ///
    /// Under `Fallback` a failed segment keeps its source text and a warning is
    /// returned for it. Under `Abort` the lowest-indexed failure is returned as
    /// an error and no segment is modified.
    pub async fn translate_segments<F>(
        &self,
        segments: &mut [Segment],
        progress_callback: F,
    ) -> Result<Vec<ConstraintWarning>, SegmentationError>
    where
        F: Fn(usize, usize) + Clone + Send + Sync,
    {
        let total = segments.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let processed = Arc::new(AtomicUsize::new(0));
        let work: Vec<(usize, String)> = segments
            .iter()
            .enumerate()
            .map(|(idx, segment)| (idx, segment.source_text.clone()))
            .collect();

        let mut results = stream::iter(work)
            .map(|(segment_index, text)| {
                let semaphore = Arc::clone(&self.semaphore);
                let processed = Arc::clone(&processed);
                let progress_callback = progress_callback.clone();

                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => self.translate_with_retry(&text).await,
                        Err(e) => Err(TranslationError::Unavailable(e.to_string())),
                    };

                    let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);

                    (segment_index, result)
                }
            })
            .buffer_unordered(self.options.concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        // Ordering barrier: results go back in segment order
        results.sort_by_key(|(idx, _)| *idx);

        if self.options.failure_policy == FailurePolicy::Abort {
            if let Some(pos) = results.iter().position(|(_, result)| result.is_err()) {
                let (segment_index, result) = results.swap_remove(pos);
                if let Err(source) = result {
                    return Err(SegmentationError::TranslationAborted {
                        segment_index,
                        source,
                    });
                }
            }
        }

        let mut warnings = Vec::new();
        for (segment_index, result) in results {
            let segment = &mut segments[segment_index];
            match result {
                Ok(translated) => segment.translated_text = Some(translated),
                Err(error) => {
                    warn!(
                        "Segment {} kept in source language ('{}'): {}",
                        segment_index + 1,
                        truncate_text(&segment.source_text, 30),
                        error
                    );
                    segment.translated_text = None;
                    warnings.push(ConstraintWarning {
                        segment_index,
                        cue_index: None,
                        kind: WarningKind::TranslationFallback {
                            error: error.to_string(),
                        },
                    });
                }
            }
        }

        let (hits, misses, _) = self.cache.stats();
        debug!(
            "Translated {} segments with {} ({} fallbacks, cache {} hits / {} misses)",
            total,
            self.translator.name(),
            warnings.len(),
            hits,
            misses
        );

        Ok(warnings)
    }

    /// Translate one text, consulting the cache and retrying with exponential backoff
    pub async fn translate_with_retry(&self, text: &str) -> Result<String, TranslationError> {
        if let Some(cached) = self
            .cache
            .get(text, &self.source_language, &self.target_language)
        {
            return Ok(cached);
        }

        let mut attempt: u32 = 0;
        loop {
            let result = self
                .translator
                .translate(text, &self.source_language, &self.target_language)
                .await
                .and_then(|translated| {
                    let translated = translated.trim();
                    if translated.is_empty() {
                        Err(TranslationError::EmptyResponse(truncate_text(text, 50)))
                    } else {
                        Ok(translated.to_string())
                    }
                });

            match result {
                Ok(translated) => {
                    self.cache
                        .store(text, &self.source_language, &self.target_language, &translated);
                    return Ok(translated);
                }
                Err(error) if attempt < self.options.retry_count && error.is_retryable() => {
                    let backoff = self.options.retry_backoff_ms.saturating_mul(1u64 << attempt.min(16));
                    debug!(
                        "Translation attempt {}/{} failed: {} (retrying in {}ms)",
                        attempt + 1,
                        self.options.retry_count + 1,
                        error,
                        backoff
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
