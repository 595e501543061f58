//! Slide body generation: one sanitized HTML fragment per plan entry.

use crate::capability::{complete_within, CompletionCapability};
use crate::model::SlideKind;
use crate::pipeline::markup::{escape_html, extract_content_block, sanitize_body, strip_code_fences};
use crate::prompts::slide_body_prompt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Produces slide bodies.
#[derive(Clone)]
pub struct ContentGenerator {
    completion: Option<Arc<dyn CompletionCapability>>,
    timeout: Duration,
}

impl ContentGenerator {
    pub fn new(completion: Option<Arc<dyn CompletionCapability>>, timeout: Duration) -> Self {
        Self {
            completion,
            timeout,
        }
    }

    /// Generate the sanitized HTML body for one slide. Never fails.
    ///
    /// `Image` slides carry no body; the image fills the slide.
    pub async fn generate_body(&self, title: &str, kind: SlideKind, topic: &str) -> String {
        if kind == SlideKind::Image {
            return String::new();
        }

        let extracted = match self.completion {
            Some(ref completion) => {
                let prompt = slide_body_prompt(title, kind, topic);
                match complete_within(completion.as_ref(), &prompt, self.timeout).await {
                    Ok(raw) => extract_content_block(&strip_code_fences(&raw)),
                    Err(e) => {
                        warn!("Content for '{}' failed ({}); using fallback", title, e);
                        String::new()
                    }
                }
            }
            None => String::new(),
        };

        let body = if extracted.is_empty() {
            debug!("Empty content for '{}'; using {} fallback", title, kind);
            fallback_body(title, kind)
        } else {
            extracted
        };

        let clean = sanitize_body(&body);
        if clean.is_empty() {
            warn!("Content for '{}' was empty after sanitizing; using fallback", title);
            return sanitize_body(&fallback_body(title, kind));
        }
        clean
    }
}

/// Fixed kind-specific body used when the model gives nothing usable.
pub fn fallback_body(title: &str, kind: SlideKind) -> String {
    match kind {
        SlideKind::Title => format!(
            "<p>Discover <strong>{}</strong></p><p>Changing the way we learn for good.</p>",
            escape_html(title)
        ),
        SlideKind::Bullet => "<ul>\
             <li>AI adapts to each learner's style</li>\
             <li>Chatbots offer support around the clock</li>\
             <li>Assignments are graded in seconds</li>\
             <li>Weak spots are detected early</li>\
             <li>Every learner gets a personal path</li>\
             </ul>"
            .to_string(),
        SlideKind::Cta => "<div class=\"cta\">\
             <p>Start today!</p>\
             <button class=\"cta-button\">Explore Now!</button>\
             </div>"
            .to_string(),
        SlideKind::Image => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Answer {
        text: Result<String, CapabilityError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionCapability for Answer {
        async fn complete(&self, _prompt: &str) -> Result<String, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.text.clone()
        }
    }

    fn generator(text: Result<&str, CapabilityError>) -> (ContentGenerator, Arc<Answer>) {
        let answer = Arc::new(Answer {
            text: text.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let gen = ContentGenerator::new(
            Some(Arc::clone(&answer) as Arc<dyn CompletionCapability>),
            Duration::from_secs(5),
        );
        (gen, answer)
    }

    #[tokio::test]
    async fn extracts_and_sanitizes_model_output() {
        let (gen, _) = generator(Ok(
            r#"Here you go: <div class="content"><ul><li>Fast</li><script>x()</script></ul></div>"#,
        ));
        let body = gen.generate_body("Speed", SlideKind::Bullet, "AI").await;
        assert_eq!(body, "<ul><li>Fast</li></ul>");
    }

    #[tokio::test]
    async fn image_slides_skip_the_model() {
        let (gen, answer) = generator(Ok("<p>ignored</p>"));
        let body = gen.generate_body("Picture", SlideKind::Image, "AI").await;
        assert!(body.is_empty());
        assert_eq!(answer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_content_block_uses_fallback() {
        let (gen, _) = generator(Ok(r#"<div class="content">   </div>"#));
        let body = gen.generate_body("Tools", SlideKind::Bullet, "AI").await;
        assert_eq!(body.matches("<li>").count(), 5);
    }

    #[tokio::test]
    async fn failure_uses_kind_specific_fallback() {
        let err = CapabilityError::EmptyResponse {
            capability: "completion",
        };
        let (gen, _) = generator(Err(err));
        let title = gen.generate_body("<Big> Ideas", SlideKind::Title, "AI").await;
        assert!(title.contains("&lt;Big&gt; Ideas"), "got: {title}");

        let cta = gen.generate_body("Go", SlideKind::Cta, "AI").await;
        assert!(cta.contains(r#"<div class="cta">"#), "got: {cta}");
        assert!(cta.contains(r#"<button class="cta-button">"#), "got: {cta}");
    }

    #[tokio::test]
    async fn script_only_answer_falls_back() {
        let (gen, _) = generator(Ok("<script>alert(1)</script>"));
        let body = gen.generate_body("Tools", SlideKind::Bullet, "AI").await;
        assert!(!body.contains("alert"));
        assert_eq!(body.matches("<li>").count(), 5);
    }

    #[tokio::test]
    async fn no_capability_uses_fallback() {
        let gen = ContentGenerator::new(None, Duration::from_secs(1));
        let body = gen.generate_body("Join", SlideKind::Cta, "AI").await;
        assert!(body.contains("cta-button"));
    }
}
