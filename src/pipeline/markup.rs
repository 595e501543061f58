//! Pure text transforms over model output and slide markup.
//!
//! Each function is `&str → String` with no shared state, so concurrent jobs
//! never contend on a sanitizer or matcher instance.

use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").unwrap());

/// Strip one pair of outer markdown code fences (` ```json `, ` ```html `, …).
///
/// Models sometimes wrap their answer in fences despite the prompt. Input
/// without outer fences is returned trimmed.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

static RE_CONTENT_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<div[^>]*\bclass\s*=[^>]*content[^>]*>(.*?)</div>"#).unwrap()
});

/// Extract the inner HTML of the first `<div>` whose class mentions `content`.
///
/// Postcondition: returns the trimmed inner HTML of that block, or the
/// trimmed input when no such block exists. The match stops at the first
/// closing `</div>`.
pub fn extract_content_block(html: &str) -> String {
    match RE_CONTENT_DIV.captures(html) {
        Some(caps) => caps[1].trim().to_string(),
        None => html.trim().to_string(),
    }
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const ALLOWED_TAGS: &[&str] = &[
    "div", "p", "br", "span", "ul", "ol", "li", "strong", "b", "em", "i", "u", "small", "sub",
    "sup", "code", "blockquote", "h2", "h3", "button",
];

/// Sanitize a slide body against the structural allow-list.
///
/// Keeps lists, paragraphs, emphasis and the call-to-action button. The only
/// classes that survive are `div.cta` and `button.cta-button`, the two the
/// deck stylesheet defines. `<script>` and `<style>` are dropped together
/// with their contents; every other disallowed tag is unwrapped to its text.
pub fn sanitize_body(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
    let mut builder = Builder::default();
    builder
        .tags(tags)
        .add_allowed_classes("div", &["cta"])
        .add_allowed_classes("button", &["cta-button"]);
    builder.clean(html).to_string().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let input = "```json\n[{\"title\": \"A\"}]\n```";
        assert_eq!(strip_code_fences(input), "[{\"title\": \"A\"}]");
    }

    #[test]
    fn unfenced_passthrough() {
        assert_eq!(strip_code_fences("  <p>x</p> \n"), "<p>x</p>");
    }

    #[test]
    fn extracts_first_content_div() {
        let raw = r#"Sure! <div class="content"><p>Hello</p></div> <div class="content">two</div>"#;
        assert_eq!(extract_content_block(raw), "<p>Hello</p>");
    }

    #[test]
    fn extraction_matches_any_class_mentioning_content() {
        let raw = "<DIV class='slide-content main'>\n<ul><li>x</li></ul>\n</DIV>";
        assert_eq!(extract_content_block(raw), "<ul><li>x</li></ul>");
    }

    #[test]
    fn extraction_without_container_returns_raw() {
        assert_eq!(extract_content_block("  <p>plain</p>  "), "<p>plain</p>");
    }

    #[test]
    fn escape_covers_structural_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn sanitize_removes_script_keeps_structure() {
        let dirty = "<ul><li>One</li><script>alert('x')</script><li><strong>Two</strong></li></ul>";
        let clean = sanitize_body(dirty);
        assert!(!clean.contains("script"), "got: {clean}");
        assert!(!clean.contains("alert"), "got: {clean}");
        assert!(clean.contains("<ul>"));
        assert!(clean.contains("<li><strong>Two</strong></li>"));
    }

    #[test]
    fn sanitize_strips_event_handlers_and_foreign_classes() {
        let dirty = r#"<p onclick="steal()" class="slide">Hi</p><button class="cta-button evil">Go</button>"#;
        let clean = sanitize_body(dirty);
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("slide"));
        assert!(!clean.contains("evil"));
        assert!(clean.contains(r#"<button class="cta-button">Go</button>"#), "got: {clean}");
    }

    #[test]
    fn sanitize_unwraps_disallowed_tags() {
        let clean = sanitize_body(r#"<p>See <a href="https://x.test">this</a><img src="y.png"></p>"#);
        assert_eq!(clean, "<p>See this</p>");
    }

    #[test]
    fn sanitize_blank_is_empty() {
        assert_eq!(sanitize_body("   "), "");
    }
}
