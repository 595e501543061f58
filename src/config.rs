//! Configuration types for deck generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. Worker-pool sizing lives separately in
//! [`PoolConfig`] because it is a deployment decision, not a per-deck one.

use crate::capability::{CompletionCapability, ImageSearch};
use crate::error::SlideError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Stock-photo domains the primary image search is restricted to.
pub const DEFAULT_SEARCH_DOMAINS: &[&str] = &["unsplash.com", "pexels.com", "pixabay.com"];

/// Configuration for generating a deck.
///
/// # Example
/// ```rust
/// use aislide::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-nano")
///     .api_timeout_secs(20)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed completion capability. Takes precedence over `provider_name`.
    pub completion: Option<Arc<dyn CompletionCapability>>,

    /// Pre-constructed image search capability. Takes precedence over the
    /// Google credentials below.
    pub image_search: Option<Arc<dyn ImageSearch>>,

    /// Sampling temperature for content generation. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens per completion. Default: 800.
    pub max_tokens: usize,

    /// Per-completion timeout in seconds. Default: 30.
    pub api_timeout_secs: u64,

    /// Connect/read timeout for image search requests in seconds. Default: 8.
    pub search_timeout_secs: u64,

    /// Timeout for the rendering collaborator in seconds. Default: 120.
    pub render_timeout_secs: u64,

    /// Google Custom Search API key.
    pub google_api_key: Option<String>,

    /// Google Custom Search engine id.
    pub google_cx: Option<String>,

    /// Domains the primary image search is restricted to.
    pub search_domains: Vec<String>,

    /// Upper bound on resolved images per job. Default: 5.
    pub max_images_per_job: usize,

    /// Receives per-slide progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            completion: None,
            image_search: None,
            temperature: 0.7,
            max_tokens: 800,
            api_timeout_secs: 30,
            search_timeout_secs: 8,
            render_timeout_secs: 120,
            google_api_key: None,
            google_cx: None,
            search_domains: DEFAULT_SEARCH_DOMAINS.iter().map(|d| d.to_string()).collect(),
            max_images_per_job: 5,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("completion", &self.completion.as_ref().map(|_| "<dyn CompletionCapability>"))
            .field("image_search", &self.image_search.as_ref().map(|_| "<dyn ImageSearch>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "<redacted>"))
            .field("google_cx", &self.google_cx)
            .field("search_domains", &self.search_domains)
            .field("max_images_per_job", &self.max_images_per_job)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn completion(mut self, completion: Arc<dyn CompletionCapability>) -> Self {
        self.config.completion = Some(completion);
        self
    }

    pub fn image_search(mut self, search: Arc<dyn ImageSearch>) -> Self {
        self.config.image_search = Some(search);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = secs;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn google_credentials(mut self, api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        self.config.google_api_key = Some(api_key.into());
        self.config.google_cx = Some(cx.into());
        self
    }

    pub fn search_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.search_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_images_per_job(mut self, n: usize) -> Self {
        self.config.max_images_per_job = n;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, SlideError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 || c.search_timeout_secs == 0 || c.render_timeout_secs == 0 {
            return Err(SlideError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(SlideError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Worker pool ──────────────────────────────────────────────────────────

/// What [`crate::pool::WorkerPool::submit`] does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Wait until a slot frees up. (default)
    #[default]
    Block,
    /// Fail immediately with [`SlideError::QueueFull`].
    Reject,
}

/// Sizing of the background worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of worker tasks draining the queue. Range: 1–5. Default: 2.
    pub workers: usize,
    /// Jobs that may wait in the queue. Default: 100.
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
}

/// Hard ceiling on worker tasks.
pub const MAX_WORKERS: usize = 5;

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 100,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), SlideError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(SlideError::InvalidConfig(format!(
                "workers must be 1–{MAX_WORKERS}, got {}",
                self.workers
            )));
        }
        if self.queue_capacity == 0 {
            return Err(SlideError::InvalidConfig(
                "queue_capacity must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = GenerationConfig::default();
        assert_eq!(c.max_images_per_job, 5);
        assert_eq!(c.search_timeout_secs, 8);
        assert_eq!(c.search_domains.len(), 3);
        assert!(c.completion.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = GenerationConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let err = GenerationConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, SlideError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = GenerationConfig::builder()
            .google_credentials("secret-key", "cx-1")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains("cx-1"));
    }

    #[test]
    fn pool_config_bounds() {
        assert!(PoolConfig::default().validate().is_ok());
        let too_many = PoolConfig {
            workers: 6,
            ..PoolConfig::default()
        };
        assert!(too_many.validate().is_err());
        let no_queue = PoolConfig {
            queue_capacity: 0,
            ..PoolConfig::default()
        };
        assert!(no_queue.validate().is_err());
    }
}
