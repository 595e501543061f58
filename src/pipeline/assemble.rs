//! Document assembly: fold slide fragments into one self-contained HTML deck.
//!
//! Output order is plan order. The renderer paginates strictly in document
//! order, one `.slide` block per page.

use crate::model::SlideFragment;
use crate::pipeline::markup::escape_html;

const PREAMBLE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8" />
  <title>AI Slides</title>
  <style>
    @page { size: 1920px 1080px; margin: 0; }
    body { margin: 0; padding: 0; font-family: 'NotoSans', Arial, sans-serif; background: #f9fafb; }
    .slide { width: 1920px; height: 1080px; page-break-after: always; page-break-inside: avoid; padding: 80px; box-sizing: border-box; display: flex; gap: 60px; align-items: flex-start; background: #ffffff; }
    .col-left { flex: 1.4; display: flex; flex-direction: column; }
    .col-left h1 { font-size: 72px; margin: 0 0 50px; color: #1e293b; text-align: center; line-height: 1.2; font-weight: 700; }
    .content { font-size: 36px; line-height: 1.6; color: #334155; }
    .content ul { list-style: none; padding: 0; margin: 0; }
    .content li { margin: 24px 0; position: relative; padding-left: 44px; }
    .content li:before { content: '•'; color: #f59e0b; position: absolute; left: 0; font-size: 36px; font-weight: bold; top: -4px; }
    .col-right { flex: 0.6; display: flex; align-items: center; justify-content: center; }
    .col-right img { width: 100%; max-width: 520px; height: auto; max-height: 720px; border-radius: 28px; box-shadow: 0 25px 50px rgba(0,0,0,0.2); object-fit: cover; }
    .cta { text-align: center; margin-top: auto; }
    .cta p { font-size: 52px; margin-bottom: 40px; color: #1e293b; }
    .cta-button { background: linear-gradient(135deg, #f59e0b, #f97316); color: white; font-weight: 800; padding: 28px 90px; font-size: 54px; border-radius: 80px; border: none; box-shadow: 0 15px 35px rgba(249,115,22,0.35); }
  </style>
</head>
<body>
"#;

const POSTAMBLE: &str = "</body>\n</html>\n";

/// Marker that opens every slide block; one per rendered page.
pub const SLIDE_OPEN_TAG: &str = r#"<div class="slide">"#;

/// Assemble the full deck. Pure: identical input gives byte-identical output.
pub fn assemble(fragments: &[SlideFragment]) -> String {
    let mut doc = String::with_capacity(PREAMBLE.len() + fragments.len() * 512);
    doc.push_str(PREAMBLE);
    for fragment in fragments {
        push_slide(&mut doc, fragment);
    }
    doc.push_str(POSTAMBLE);
    doc
}

fn push_slide(doc: &mut String, fragment: &SlideFragment) {
    let title = escape_html(&fragment.title);
    let image = fragment
        .image_url
        .as_deref()
        .map(|url| format!(r#"<img src="{}" alt="{}" />"#, escape_html(url), title))
        .unwrap_or_default();

    doc.push_str(SLIDE_OPEN_TAG);
    doc.push_str("\n  <div class=\"col-left\">\n    <h1>");
    doc.push_str(&title);
    doc.push_str("</h1>\n    <div class=\"content\">");
    doc.push_str(&fragment.body);
    doc.push_str("</div>\n  </div>\n  <div class=\"col-right\">");
    doc.push_str(&image);
    doc.push_str("</div>\n</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(title: &str, image: Option<&str>) -> SlideFragment {
        SlideFragment {
            title: title.to_string(),
            body: "<p>Body</p>".to_string(),
            image_url: image.map(str::to_string),
        }
    }

    #[test]
    fn one_block_per_fragment_in_order() {
        let frags = vec![
            fragment("First", None),
            fragment("Second", Some("https://x.test/a.jpg")),
            fragment("Third", None),
        ];
        let doc = assemble(&frags);
        assert_eq!(doc.matches(SLIDE_OPEN_TAG).count(), 3);
        let first = doc.find("<h1>First</h1>").unwrap();
        let second = doc.find("<h1>Second</h1>").unwrap();
        let third = doc.find("<h1>Third</h1>").unwrap();
        assert!(first < second && second < third);
        assert_eq!(doc.matches("<img ").count(), 1);
    }

    #[test]
    fn is_byte_identical_across_calls() {
        let frags = vec![fragment("A & B", Some("https://x.test/?q=a&b=c"))];
        assert_eq!(assemble(&frags), assemble(&frags));
    }

    #[test]
    fn escapes_title_and_image_url() {
        let doc = assemble(&[fragment(
            "</h1><script>x</script>",
            Some("https://x.test/?a=1&b=\"2\""),
        )]);
        assert!(!doc.contains("<script>"));
        assert!(doc.contains("&lt;/h1&gt;&lt;script&gt;"));
        assert!(doc.contains(r#"src="https://x.test/?a=1&amp;b=&quot;2&quot;""#));
    }

    #[test]
    fn empty_deck_is_still_a_document() {
        let doc = assemble(&[]);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.ends_with("</html>\n"));
        assert_eq!(doc.matches(SLIDE_OPEN_TAG).count(), 0);
    }
}
