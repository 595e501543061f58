//! External capabilities the pipeline consumes: text completion and image search.
//!
//! Both are expressed as object-safe async traits so the orchestrator can hold
//! `Arc<dyn …>` handles, and tests can swap in scripted implementations without
//! touching the network. Every method returns [`CapabilityError`] on failure;
//! callers are expected to fall back rather than propagate.

use crate::config::GenerationConfig;
use crate::error::CapabilityError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const COMPLETION: &str = "completion";
const IMAGE_SEARCH: &str = "image search";

/// Text generation: `complete(prompt) -> text`.
#[async_trait]
pub trait CompletionCapability: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError>;
}

/// Image search: `search(query) -> candidate links`, best match first.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>, CapabilityError>;
}

/// Run a completion with a hard timeout.
///
/// A timeout is reported like any other capability failure so callers treat
/// it identically.
pub async fn complete_within(
    completion: &dyn CompletionCapability,
    prompt: &str,
    timeout: Duration,
) -> Result<String, CapabilityError> {
    match tokio::time::timeout(timeout, completion.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(CapabilityError::Timeout {
            capability: COMPLETION,
            secs: timeout.as_secs(),
        }),
    }
}

/// Run an image search with a hard timeout, independent of any timeout the
/// implementation applies itself.
pub async fn search_within(
    search: &dyn ImageSearch,
    query: &str,
    timeout: Duration,
) -> Result<Vec<String>, CapabilityError> {
    match tokio::time::timeout(timeout, search.search(query)).await {
        Ok(result) => result,
        Err(_) => Err(CapabilityError::Timeout {
            capability: IMAGE_SEARCH,
            secs: timeout.as_secs(),
        }),
    }
}

// ── LLM-backed completion ────────────────────────────────────────────────

/// [`CompletionCapability`] backed by an `edgequake-llm` provider.
pub struct LlmCompletion {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            options: CompletionOptions {
                temperature: Some(temperature),
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl CompletionCapability for LlmCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| CapabilityError::Request {
                capability: COMPLETION,
                detail: e.to_string(),
            })?;

        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(CapabilityError::EmptyResponse {
                capability: COMPLETION,
            });
        }
        Ok(response.content)
    }
}

/// Resolve the completion capability, from most-specific to least-specific.
///
/// 1. **Pre-built capability** (`config.completion`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key** (`OPENAI_API_KEY`) with the configured or default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// Returns `None` when nothing can be constructed. The pipeline still runs in
/// that case; every stage uses its deterministic fallback.
pub fn resolve_completion(config: &GenerationConfig) -> Option<Arc<dyn CompletionCapability>> {
    if let Some(ref completion) = config.completion {
        return Some(Arc::clone(completion));
    }

    let provider = resolve_provider(config)?;
    Some(Arc::new(LlmCompletion::new(
        provider,
        config.temperature,
        config.max_tokens,
    )))
}

fn resolve_provider(config: &GenerationConfig) -> Option<Arc<dyn LLMProvider>> {
    let default_model = config.model.as_deref().unwrap_or("gpt-4.1-nano");

    if let Some(ref name) = config.provider_name {
        return create_provider(name, default_model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", default_model);
        }
    }

    match ProviderFactory::from_env() {
        Ok((llm_provider, _embedding)) => Some(llm_provider),
        Err(e) => {
            warn!(
                "No LLM provider could be auto-detected ({}); using built-in fallbacks",
                e
            );
            None
        }
    }
}

fn create_provider(provider_name: &str, model: &str) -> Option<Arc<dyn LLMProvider>> {
    match ProviderFactory::create_llm_provider(provider_name, model) {
        Ok(provider) => {
            info!("Using LLM provider '{}' with model '{}'", provider_name, model);
            Some(provider)
        }
        Err(e) => {
            warn!(
                "LLM provider '{}' is not configured ({}); using built-in fallbacks",
                provider_name, e
            );
            None
        }
    }
}

// ── Google Custom Search ─────────────────────────────────────────────────

const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// [`ImageSearch`] over the Google Custom Search JSON API, restricted to a
/// set of stock-photo domains.
pub struct GoogleImageSearch {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    domains: Vec<String>,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    link: Option<String>,
}

impl GoogleImageSearch {
    pub fn new(
        api_key: impl Into<String>,
        cx: impl Into<String>,
        domains: Vec<String>,
        timeout_secs: u64,
    ) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeout_secs))
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("aislide/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CapabilityError::Request {
                capability: IMAGE_SEARCH,
                detail: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            cx: cx.into(),
            domains,
            timeout_secs,
        })
    }

    /// Build from config credentials; `None` when either is missing or blank.
    pub fn from_config(config: &GenerationConfig) -> Option<Self> {
        let key = config.google_api_key.as_deref().filter(|k| !k.trim().is_empty());
        let cx = config.google_cx.as_deref().filter(|c| !c.trim().is_empty());
        match (key, cx) {
            (Some(key), Some(cx)) => match Self::new(
                key,
                cx,
                config.search_domains.clone(),
                config.search_timeout_secs,
            ) {
                Ok(search) => Some(search),
                Err(e) => {
                    warn!("Image search disabled: {}", e);
                    None
                }
            },
            _ => None,
        }
    }

    /// Append the `site:` restriction to the user query.
    fn restricted_query(&self, query: &str) -> String {
        if self.domains.is_empty() {
            return query.to_string();
        }
        let sites = self
            .domains
            .iter()
            .map(|d| format!("site:{d}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("{query} {sites}")
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, CapabilityError> {
        let q = self.restricted_query(query);
        let response = self
            .client
            .get(GOOGLE_CSE_ENDPOINT)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", q.as_str()),
                ("searchType", "image"),
                ("num", "5"),
                ("safe", "active"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CapabilityError::Timeout {
                        capability: IMAGE_SEARCH,
                        secs: self.timeout_secs,
                    }
                } else {
                    CapabilityError::Request {
                        capability: IMAGE_SEARCH,
                        detail: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(CapabilityError::Request {
                capability: IMAGE_SEARCH,
                detail: format!("HTTP {}", response.status()),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| CapabilityError::Request {
            capability: IMAGE_SEARCH,
            detail: e.to_string(),
        })?;

        let links: Vec<String> = body.items.into_iter().filter_map(|i| i.link).collect();
        debug!("Image search '{}' → {} candidates", query, links.len());
        Ok(links)
    }
}

/// Resolve the image search capability: pre-built first, then Google
/// credentials. `None` means the primary search tier is skipped.
pub fn resolve_image_search(config: &GenerationConfig) -> Option<Arc<dyn ImageSearch>> {
    if let Some(ref search) = config.image_search {
        return Some(Arc::clone(search));
    }
    match GoogleImageSearch::from_config(config) {
        Some(search) => Some(Arc::new(search)),
        None => {
            warn!("Google image search credentials not configured; using stock-photo fallback");
            None
        }
    }
}
