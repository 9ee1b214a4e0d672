/*!
 * Tests for concurrent segment translation
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use syncsub::errors::{SegmentationError, TranslationError};
use syncsub::providers::mock::{MockProvider, MockRequest};
use syncsub::segmentation::{Segment, WarningKind};
use syncsub::translation::{BatchOptions, BatchTranslator, FailurePolicy};

use crate::common::{fast_options, mock_translator, segment};

fn segments(texts: &[&str]) -> Vec<Segment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| segment(text, i as f64 * 2.0, i as f64 * 2.0 + 1.5))
        .collect()
}

fn upper(request: &MockRequest) -> String {
    request.text.to_uppercase()
}

#[tokio::test]
async fn test_translate_withSlowProvider_shouldKeepSegmentOrder() {
    let translator = mock_translator(MockProvider::slow(5), fast_options(FailurePolicy::Abort, 4, 0));
    let texts: Vec<String> = (0..12).map(|i| format!("line number {}", i)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let mut segs = segments(&refs);

    let warnings = translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert!(warnings.is_empty());
    for (i, seg) in segs.iter().enumerate() {
        assert_eq!(seg.translated_text.as_deref(), Some(format!("[fr] line number {}", i).as_str()));
    }
}

fn segment_number(request: &MockRequest) -> u64 {
    request
        .text
        .rsplit(' ')
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

// Later segments answer first
fn reversed_delay(request: &MockRequest) -> u64 {
    100 - 20 * segment_number(request)
}

// Segments 1 and 3 come back empty, which counts as a failed translation
fn odd_segments_empty(request: &MockRequest) -> String {
    match segment_number(request) {
        1 | 3 => String::new(),
        _ => request.text.to_uppercase(),
    }
}

fn reversed_completion_translator(policy: FailurePolicy) -> BatchTranslator {
    let provider = MockProvider::working()
        .with_delay(reversed_delay)
        .with_custom_response(odd_segments_empty);
    mock_translator(provider, fast_options(policy, 5, 0))
}

const NUMBERED: [&str; 5] = ["segment 0", "segment 1", "segment 2", "segment 3", "segment 4"];

#[tokio::test]
async fn test_translate_withAbortAndReversedCompletion_shouldReportLowestFailingSegment() {
    let translator = reversed_completion_translator(FailurePolicy::Abort);
    let mut segs = segments(&NUMBERED);

    let result = translator.translate_segments(&mut segs, |_, _| {}).await;

    match result {
        Err(SegmentationError::TranslationAborted { segment_index, source }) => {
            assert_eq!(segment_index, 1);
            assert!(matches!(source, TranslationError::EmptyResponse(_)));
        }
        other => panic!("expected an abort on segment 1, got {:?}", other),
    }
    assert!(segs.iter().all(|s| s.translated_text.is_none()));
}

#[tokio::test]
async fn test_translate_withFallbackAndReversedCompletion_shouldWarnInSegmentOrder() {
    let translator = reversed_completion_translator(FailurePolicy::Fallback);
    let mut segs = segments(&NUMBERED);

    let warnings = translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    let warned: Vec<usize> = warnings.iter().map(|w| w.segment_index).collect();
    assert_eq!(warned, vec![1, 3]);
    assert_eq!(segs[0].display_text(), "SEGMENT 0");
    assert_eq!(segs[1].display_text(), "segment 1");
    assert_eq!(segs[2].display_text(), "SEGMENT 2");
    assert_eq!(segs[3].display_text(), "segment 3");
    assert_eq!(segs[4].display_text(), "SEGMENT 4");
}

#[tokio::test]
async fn test_translate_shouldCallProviderOncePerSegment() {
    let provider = MockProvider::working().with_custom_response(upper);
    let translator = mock_translator(provider.clone(), fast_options(FailurePolicy::Fallback, 3, 2));
    let mut segs = segments(&["one", "two", "three", "four", "five"]);

    translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert_eq!(provider.request_count(), 5);
    assert_eq!(segs[2].translated_text.as_deref(), Some("THREE"));
}

#[tokio::test]
async fn test_translate_withAbortPolicy_shouldFailAndLeaveSegmentsUntouched() {
    let translator = mock_translator(MockProvider::failing(), fast_options(FailurePolicy::Abort, 2, 1));
    let mut segs = segments(&["one", "two", "three"]);

    let result = translator.translate_segments(&mut segs, |_, _| {}).await;

    match result {
        Err(SegmentationError::TranslationAborted { segment_index, source }) => {
            assert_eq!(segment_index, 0);
            assert!(matches!(source, TranslationError::Provider(_)));
        }
        other => panic!("expected TranslationAborted, got {:?}", other),
    }
    assert!(segs.iter().all(|s| s.translated_text.is_none()));
}

#[tokio::test]
async fn test_translate_withFallbackPolicy_shouldKeepSourceAndWarn() {
    let translator = mock_translator(MockProvider::failing(), fast_options(FailurePolicy::Fallback, 2, 0));
    let mut segs = segments(&["one", "two"]);

    let warnings = translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].segment_index, 0);
    assert_eq!(warnings[1].segment_index, 1);
    assert!(warnings.iter().all(|w| w.cue_index.is_none()));
    assert!(matches!(warnings[0].kind, WarningKind::TranslationFallback { .. }));
    assert_eq!(segs[1].display_text(), "two");
}

#[tokio::test]
async fn test_translate_withIntermittentFailures_shouldRecoverThroughRetry() {
    // Every second request fails; one retry is always enough with a single worker
    let provider = MockProvider::intermittent(2);
    let translator = mock_translator(provider.clone(), fast_options(FailurePolicy::Abort, 1, 1));
    let mut segs = segments(&["a", "b", "c", "d"]);

    let warnings = translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert!(warnings.is_empty());
    assert!(segs.iter().all(|s| s.translated_text.is_some()));
    assert_eq!(provider.request_count(), 7);
}

#[tokio::test]
async fn test_translate_withClientError_shouldNotRetry() {
    let provider = MockProvider::rejecting();
    let translator = mock_translator(provider.clone(), fast_options(FailurePolicy::Fallback, 1, 3));
    let mut segs = segments(&["a", "b"]);

    let warnings = translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert_eq!(warnings.len(), 2);
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_translate_withEmptyResponse_shouldTreatAsFailure() {
    let provider = MockProvider::empty();
    let translator = mock_translator(provider.clone(), fast_options(FailurePolicy::Fallback, 1, 1));
    let mut segs = segments(&["hello"]);

    let warnings = translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert_eq!(warnings.len(), 1);
    assert_eq!(provider.request_count(), 2);
    assert!(segs[0].translated_text.is_none());
}

#[tokio::test]
async fn test_translate_withCache_shouldReuseIdenticalTexts() {
    let provider = MockProvider::working();
    let options = BatchOptions {
        cache_enabled: true,
        ..fast_options(FailurePolicy::Abort, 1, 0)
    };
    let translator = mock_translator(provider.clone(), options);
    let mut segs = segments(&["Yes.", "No.", "Yes.", "Yes."]);

    translator.translate_segments(&mut segs, |_, _| {}).await.unwrap();

    assert_eq!(provider.request_count(), 2);
    assert_eq!(segs[3].translated_text.as_deref(), Some("[fr] Yes."));
    let (hits, misses, _) = translator.cache().stats();
    assert_eq!((hits, misses), (2, 2));
}

#[tokio::test]
async fn test_translate_shouldReportProgressForEverySegment() {
    let translator = mock_translator(MockProvider::working(), fast_options(FailurePolicy::Fallback, 3, 0));
    let mut segs = segments(&["a", "b", "c", "d", "e"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let last_total = Arc::new(AtomicUsize::new(0));

    let (c, t) = (Arc::clone(&calls), Arc::clone(&last_total));
    translator
        .translate_segments(&mut segs, move |_, total| {
            c.fetch_add(1, Ordering::SeqCst);
            t.store(total, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(last_total.load(Ordering::SeqCst), 5);
}

#[test]
fn test_passthrough_shouldCopySourceText() {
    let translator = BatchTranslator::passthrough("en");
    let mut segs = segments(&["Hello world."]);

    let warnings = tokio_test::block_on(async {
        translator.translate_segments(&mut segs, |_, _| {}).await
    })
    .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(segs[0].display_text(), "Hello world.");
}
