/*!
 * Segment translation.
 *
 * - `core`: the `Translator` trait, its backends and the failure policy
 * - `batch`: bounded concurrent translation of all segments of a run
 * - `cache`: in-memory reuse of identical translations
 */

pub use self::batch::{BatchOptions, BatchTranslator};
pub use self::cache::TranslationCache;
pub use self::core::{FailurePolicy, OllamaTranslator, PassthroughTranslator, Translator};

pub mod batch;
pub mod cache;
pub mod core;
