//! Fragment translation over the merged timeline.
//!
//! Translation never touches timing: every fragment keeps its start and
//! end, only the text changes. A fragment whose translation fails keeps
//! its original text and is recorded for the run report, so one flaky
//! request cannot lose a line or shift the timeline.

use crate::defaults;
use crate::error::{Result, SubfuseError};
use crate::subtitle::Timeline;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[cfg(feature = "translate")]
pub mod http;
#[cfg(feature = "translate")]
pub use http::{LibreTranslateConfig, LibreTranslator};

/// Trait for text translation providers.
///
/// This trait allows swapping implementations (real HTTP service vs mock).
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one fragment's text into `target`.
    ///
    /// # Arguments
    /// * `text` - Text to translate
    /// * `target` - Target language code (e.g., "en", "ko")
    async fn translate(&self, text: &str, target: &str) -> Result<String>;

    /// Get the name of the provider for reporting
    fn name(&self) -> &str;
}

/// Settings for one translation pass.
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Fragments translated concurrently
    pub concurrency: usize,
    /// Pause between request dispatches, for provider rate limits
    pub request_delay: Duration,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            concurrency: defaults::TRANSLATE_CONCURRENCY,
            request_delay: Duration::from_millis(defaults::TRANSLATE_DELAY_MS),
        }
    }
}

/// A translated timeline plus everything that went wrong on the way.
#[derive(Debug)]
pub struct TranslationOutcome {
    /// Timeline with translated text and unchanged timing
    pub timeline: Timeline,
    /// One `Translation` error per failed fragment, ordered by index
    pub errors: Vec<SubfuseError>,
}

/// Translate every fragment of `timeline` into `target`.
///
/// Requests run concurrently up to `options.concurrency`, staggered by
/// `options.request_delay`. Results are reassembled by fragment index, so
/// the output order matches the input regardless of completion order.
/// A request that succeeds but returns empty or whitespace-only text
/// counts as a failure: the fragment keeps its original text.
pub async fn translate_timeline(
    translator: Arc<dyn Translator>,
    timeline: &Timeline,
    target: &str,
    options: &TranslateOptions,
) -> TranslationOutcome {
    let mut fragments = timeline.fragments.clone();
    let mut errors = Vec::new();

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks: JoinSet<(usize, Result<String>)> = JoinSet::new();

    for (index, fragment) in timeline.fragments.iter().enumerate() {
        let translator = Arc::clone(&translator);
        let semaphore = Arc::clone(&semaphore);
        let text = fragment.text.clone();
        let target = target.to_string();
        tasks.spawn(async move {
            let _permit = semaphore.acquire().await;
            (index, translator.translate(&text, &target).await)
        });
        if !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(translated))) => {
                // Empty text would serialize as a textless SRT block,
                // which re-parsing drops.
                if translated.trim().is_empty() {
                    errors.push(SubfuseError::Translation {
                        fragment_index: index,
                        message: "provider returned empty text".to_string(),
                    });
                } else if let Some(fragment) = fragments.get_mut(index) {
                    fragment.text = translated;
                }
            }
            Ok((index, Err(e))) => {
                errors.push(SubfuseError::Translation {
                    fragment_index: index,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                errors.push(SubfuseError::Other(format!("translation task failed: {e}")));
            }
        }
    }

    errors.sort_by_key(error_order);

    TranslationOutcome {
        timeline: Timeline::new(fragments),
        errors,
    }
}

fn error_order(error: &SubfuseError) -> usize {
    match error {
        SubfuseError::Translation { fragment_index, .. } => *fragment_index,
        _ => usize::MAX,
    }
}

/// Mock translator for testing.
///
/// Canned text mappings with a deterministic `[target] text` fallback,
/// plus failure injection keyed on the source text.
#[derive(Debug, Default)]
pub struct MockTranslator {
    mappings: HashMap<String, String>,
    fail_on: HashSet<String>,
}

impl MockTranslator {
    /// Create a new mock with no canned mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate `from` as `to` instead of the fallback.
    pub fn with_mapping(mut self, from: &str, to: &str) -> Self {
        self.mappings.insert(from.to_string(), to.to_string());
        self
    }

    /// Fail every request for exactly this text.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on.insert(text.to_string());
        self
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        if self.fail_on.contains(text) {
            return Err(SubfuseError::Other("mock translation failure".to_string()));
        }
        Ok(self
            .mappings
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{target}] {text}")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
