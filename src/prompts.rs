//! Prompts sent to the completion capability.
//!
//! Every prompt lives here so wording can change without touching the
//! fallback or validation logic in [`crate::pipeline`], and so tests can
//! inspect prompts without a live model.

use crate::model::SlideKind;

/// Prompt asking for slide metadata only: a JSON array of `{title, type}`.
pub fn outline_prompt(topic: &str, count: usize) -> String {
    format!(
        r#"Create EXACTLY {count} slides about the topic: "{topic}"
Return ONLY a JSON array (no ``` fences), for example:
[
  {{"title": "How AI Changes Learning", "type": "TITLE"}},
  {{"title": "Powerful AI Tools", "type": "BULLET"}},
  {{"title": "Real-World Applications", "type": "IMAGE"}},
  ...
]
Rules:
- title: 3-7 words, NO digits, NO repeated titles.
- type: one of TITLE, BULLET, IMAGE, CTA.
- Only 3-4 IMAGE slides.
- Slide metadata only, no body text.
- No repeated ideas; short and engaging."#
    )
}

/// Prompt asking for the HTML body of one slide.
pub fn slide_body_prompt(title: &str, kind: SlideKind, topic: &str) -> String {
    let requirement = match kind {
        SlideKind::Title => "2-3 short, engaging sentences in <p> tags.",
        SlideKind::Bullet => "a <ul> with exactly 5 <li> points, one sentence each (at most 12 words).",
        SlideKind::Image => "nothing.",
        SlideKind::Cta => "one sentence in a <p> followed by <button class=\"cta-button\">…</button>.",
    };
    format!(
        r#"Write the content for one presentation slide.
Title: "{title}"
Topic: {topic}
Type: {kind}
Content required: {requirement}
Return ONLY <div class="content">...</div> with no explanation."#
    )
}

/// Prompt asking for 1–3 English topical keywords.
pub fn keyword_prompt(text: &str) -> String {
    format!(
        "From the following text, extract 1-3 short English keywords describing its main topic.\n\
         Reply with the keywords only, separated by commas. Example: education, technology, nature\n\n\
         Text:\n{text}"
    )
}
