//! Image resolution with tiered fallback.
//!
//! ```text
//! title + content ──▶ keywords ──▶ 1. image search (trusted stock domains)
//!                                   │ unavailable / error / nothing usable
//!                                   ▼
//!                                2. stock-photo URL built from the keywords
//! ```
//!
//! Tier 2 is pure URL construction and cannot fail, so [`ImageResolver::resolve_image`]
//! always returns a usable URL. The standalone single-image path
//! ([`ImageResolver::resolve_single_image`]) ends instead in a placeholder
//! seeded by a stable hash of the title.

use crate::capability::{search_within, ImageSearch};
use crate::pipeline::keywords::{KeywordExtractor, DEFAULT_KEYWORD};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extensions rejected from search results (vector or animated).
const REJECTED_EXTENSIONS: &[&str] = &[".svg", ".gif"];

/// Where a resolved image URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    GoogleSearch,
    Unsplash,
    Placeholder,
    Local,
    Web,
}

impl ImageSource {
    /// Classify a URL by its host or shape.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with('/') {
            ImageSource::Local
        } else if url.contains("googleapis") || url.contains("customsearch") {
            ImageSource::GoogleSearch
        } else if url.contains("unsplash") {
            ImageSource::Unsplash
        } else if url.contains("picsum") {
            ImageSource::Placeholder
        } else {
            ImageSource::Web
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageSource::GoogleSearch => "Google CSE",
            ImageSource::Unsplash => "Unsplash",
            ImageSource::Placeholder => "Picsum (fallback)",
            ImageSource::Local => "Local",
            ImageSource::Web => "Web",
        })
    }
}

/// Tiered image resolver.
#[derive(Clone)]
pub struct ImageResolver {
    search: Option<Arc<dyn ImageSearch>>,
    keywords: KeywordExtractor,
    search_timeout: Duration,
}

impl ImageResolver {
    /// `search_timeout` bounds each search call; a stalled search counts as
    /// a failure and the next tier takes over.
    pub fn new(
        search: Option<Arc<dyn ImageSearch>>,
        keywords: KeywordExtractor,
        search_timeout: Duration,
    ) -> Self {
        Self {
            search,
            keywords,
            search_timeout,
        }
    }

    /// Resolve an illustration for a slide. Always returns an absolute URL.
    pub async fn resolve_image(&self, title: &str, content: &str) -> String {
        let raw = format!("{title} {content}");
        let raw = raw.trim();
        if raw.is_empty() {
            return stock_photo_url(DEFAULT_KEYWORD);
        }

        let query = self.keywords.extract_keywords(raw).await.join(" ");
        info!("Resolving image for '{}' (query: {})", title, query);

        if let Some(url) = self.search_tier(&query).await {
            info!("Image found via search: {}", url);
            return url;
        }

        let url = stock_photo_url(&query);
        info!("Image fallback ({}): {}", ImageSource::from_url(&url), url);
        url
    }

    /// Standalone single-image path: search on the title, else a
    /// deterministic placeholder for that title.
    pub async fn resolve_single_image(&self, title: &str) -> String {
        let query = format!("{} minimal illustration", title.trim());
        match self.search_tier(&query).await {
            Some(url) => url,
            None => placeholder_image(title),
        }
    }

    /// Tier 1: first acceptable candidate from the search capability.
    async fn search_tier(&self, query: &str) -> Option<String> {
        let search = self.search.as_ref()?;
        match search_within(&**search, query, self.search_timeout).await {
            Ok(candidates) => {
                let found = candidates.into_iter().find(|c| is_acceptable_image_url(c));
                if found.is_none() {
                    debug!("No acceptable search result for '{}'", query);
                }
                found
            }
            Err(e) => {
                warn!("Image search failed ({}); falling back", e);
                None
            }
        }
    }
}

/// Well-formed absolute HTTP(S) URL whose path is not a vector or animated image.
pub fn is_acceptable_image_url(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    !REJECTED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Tier 2: stock-photo service URL parameterised by the keyword string.
pub fn stock_photo_url(keywords: &str) -> String {
    let keywords = keywords.trim();
    let keywords = if keywords.is_empty() { DEFAULT_KEYWORD } else { keywords };
    format!(
        "https://source.unsplash.com/800x600/?{}",
        urlencoding::encode(keywords)
    )
}

/// Tier 3: placeholder URL seeded by a stable hash of the title.
pub fn placeholder_image(title: &str) -> String {
    format!(
        "https://picsum.photos/seed/{}/800/800?blur=1",
        stable_title_hash(title)
    )
}

/// 32-bit polynomial string hash (`h = 31·h + unit` over UTF-16 code units),
/// returned as a wrapping absolute value. Identical across runs and
/// platforms; `i32::MIN` has no positive counterpart and stays negative.
pub fn stable_title_hash(title: &str) -> i32 {
    title
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
        .wrapping_abs()
}
