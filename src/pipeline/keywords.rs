//! Keyword extraction: reduce free text to 1–3 search-safe topical keywords.
//!
//! With a completion capability the model proposes keywords, which are then
//! snapped onto a closed vocabulary of known topics so the image search never
//! sees arbitrary model output. Without one (or when the model fails) a
//! deterministic dictionary lookup takes over, so identical input always
//! yields identical keywords.

use crate::capability::{complete_within, CompletionCapability};
use crate::prompts::keyword_prompt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Returned when nothing more specific can be found.
pub const DEFAULT_KEYWORD: &str = "technology";

const MAX_KEYWORDS: usize = 3;

/// Known topic words, longest first so specific phrases win over short ones.
const KNOWN_TOPICS: &[&str] = &[
    "machine learning",
    "data science",
    "environment",
    "psychology",
    "technology",
    "blockchain",
    "education",
    "marketing",
    "business",
    "science",
    "finance",
    "climate",
    "startup",
    "history",
    "python",
    "nature",
    "design",
    "health",
    "sports",
    "travel",
    "energy",
    "music",
    "robot",
    "food",
    "ai",
];

/// Vietnamese/English phrase → keyword, longest phrase first.
const PHRASE_KEYWORDS: &[(&str, &str)] = &[
    ("trí tuệ nhân tạo", "artificial intelligence"),
    ("môi trường", "environment"),
    ("năng lượng", "energy"),
    ("kinh doanh", "business"),
    ("công nghệ", "technology"),
    ("blockchain", "blockchain"),
    ("lập trình", "programming"),
    ("tài chính", "finance"),
    ("thiết kế", "design"),
    ("khoa học", "science"),
    ("thể thao", "sports"),
    ("giáo dục", "education"),
    ("tự nhiên", "nature"),
    ("sức khỏe", "health"),
    ("âm nhạc", "music"),
    ("ẩm thực", "food"),
    ("học tập", "learning"),
    ("khí hậu", "climate"),
    ("du lịch", "travel"),
    ("python", "python"),
    ("robot", "robot"),
];

/// Keyword extractor with an optional completion capability.
#[derive(Clone)]
pub struct KeywordExtractor {
    completion: Option<Arc<dyn CompletionCapability>>,
    timeout: Duration,
}

impl KeywordExtractor {
    pub fn new(completion: Option<Arc<dyn CompletionCapability>>, timeout: Duration) -> Self {
        Self {
            completion,
            timeout,
        }
    }

    /// Extractor that only ever uses the deterministic dictionary path.
    pub fn offline() -> Self {
        Self::new(None, Duration::from_secs(1))
    }

    /// Extract 1–3 keywords describing `text`. Never fails.
    pub async fn extract_keywords(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            debug!("Blank keyword input → '{}'", DEFAULT_KEYWORD);
            return vec![DEFAULT_KEYWORD.to_string()];
        }

        if let Some(ref completion) = self.completion {
            match complete_within(completion.as_ref(), &keyword_prompt(text), self.timeout).await {
                Ok(answer) => {
                    let mapped = map_model_keywords(&answer);
                    if !mapped.is_empty() {
                        debug!("Model keywords: {:?}", mapped);
                        return mapped;
                    }
                    debug!("Model keywords '{}' matched no known topic", answer.trim());
                }
                Err(e) => warn!("Keyword completion failed ({}); using dictionary", e),
            }
        }

        extract_fallback(text)
    }
}

/// Deterministic dictionary lookup. Always returns exactly one keyword.
pub fn extract_fallback(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let hit = PHRASE_KEYWORDS
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, keyword)| *keyword)
        .or_else(|| KNOWN_TOPICS.iter().copied().find(|t| lower.contains(t)))
        .unwrap_or(DEFAULT_KEYWORD);
    vec![hit.to_string()]
}

/// Split a comma-separated model answer and snap each phrase onto a known topic.
fn map_model_keywords(answer: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for phrase in answer.split(',') {
        let phrase = phrase.trim().to_lowercase();
        if phrase.chars().count() <= 2 {
            continue;
        }
        if let Some(topic) = map_to_known_topic(&phrase) {
            if !out.iter().any(|k| k == topic) {
                out.push(topic.to_string());
            }
        }
        if out.len() == MAX_KEYWORDS {
            break;
        }
    }
    out
}

/// Substring heuristics first, then exact vocabulary membership.
fn map_to_known_topic(phrase: &str) -> Option<&'static str> {
    if phrase.contains("ai") || phrase.contains("artificial") || phrase.contains("trí tuệ") {
        return Some("artificial intelligence");
    }
    if phrase.contains("learn") || phrase.contains("study") || phrase.contains("học") {
        return Some("education");
    }
    if phrase.contains("tech") || phrase.contains("công nghệ") {
        return Some("technology");
    }
    if phrase.contains("python") {
        return Some("python");
    }
    if phrase.contains("data") || phrase.contains("machine learning") {
        return Some("data science");
    }
    KNOWN_TOPICS.iter().copied().find(|t| *t == phrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use async_trait::async_trait;

    struct Answer(Result<String, CapabilityError>);

    #[async_trait]
    impl CompletionCapability for Answer {
        async fn complete(&self, _prompt: &str) -> Result<String, CapabilityError> {
            self.0.clone()
        }
    }

    fn with_answer(answer: Result<&str, CapabilityError>) -> KeywordExtractor {
        KeywordExtractor::new(
            Some(Arc::new(Answer(answer.map(str::to_string)))),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn blank_input_returns_default() {
        let kws = KeywordExtractor::offline().extract_keywords("").await;
        assert_eq!(kws, vec![DEFAULT_KEYWORD.to_string()]);
        let kws = KeywordExtractor::offline().extract_keywords("   \n").await;
        assert_eq!(kws, vec![DEFAULT_KEYWORD.to_string()]);
    }

    #[tokio::test]
    async fn offline_is_deterministic() {
        let extractor = KeywordExtractor::offline();
        let text = "Ứng dụng trí tuệ nhân tạo trong giáo dục";
        let first = extractor.extract_keywords(text).await;
        for _ in 0..5 {
            assert_eq!(extractor.extract_keywords(text).await, first);
        }
        assert_eq!(first, vec!["artificial intelligence".to_string()]);
    }

    #[test]
    fn fallback_prefers_phrases_then_topics() {
        assert_eq!(extract_fallback("Giáo Dục hiện đại"), vec!["education"]);
        assert_eq!(extract_fallback("Intro to Machine Learning"), vec!["machine learning"]);
        assert_eq!(extract_fallback("Healthy Startup Habits"), vec!["startup"]);
        assert_eq!(extract_fallback("qwerty"), vec![DEFAULT_KEYWORD]);
    }

    #[tokio::test]
    async fn model_keywords_are_mapped_and_capped() {
        let extractor = with_answer(Ok("Studying, Technology trends, python, data, music"));
        let kws = extractor.extract_keywords("whatever").await;
        assert_eq!(kws, vec!["education", "technology", "python"]);
    }

    #[tokio::test]
    async fn unmapped_model_keywords_fall_back() {
        let extractor = with_answer(Ok("xyz, qq, lorem ipsum"));
        let kws = extractor.extract_keywords("cooking food at home").await;
        assert_eq!(kws, vec!["food"]);
    }

    #[tokio::test]
    async fn model_failure_falls_back() {
        let extractor = with_answer(Err(CapabilityError::Request {
            capability: "completion",
            detail: "401".into(),
        }));
        let kws = extractor.extract_keywords("du lịch biển").await;
        assert_eq!(kws, vec!["travel"]);
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(
            map_model_keywords("learning, study, education"),
            vec!["education"]
        );
    }
}
