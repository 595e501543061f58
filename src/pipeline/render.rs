//! Rendering: assembled markup → binary artifact.
//!
//! The renderer is the one stage with no fallback. Malformed markup, a
//! crashed converter or a timeout all end the job in `Failed`.
//!
//! Two implementations ship with the crate:
//!
//! * [`HtmlRenderer`]: returns the markup itself as an `.html` artifact.
//! * [`CommandRenderer`]: pipes the markup through an external HTML→PDF
//!   converter (e.g. `wkhtmltopdf - -`) on stdin/stdout. The converter runs
//!   as a child process so the async workers never block on it.

use crate::error::SlideError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// `render(document) -> bytes`.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// File extension of produced artifacts, without the dot.
    fn extension(&self) -> &str;

    async fn render(&self, document: &str) -> Result<Vec<u8>, SlideError>;
}

/// Passthrough renderer producing the deck as a standalone HTML file.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

#[async_trait]
impl DocumentRenderer for HtmlRenderer {
    fn extension(&self) -> &str {
        "html"
    }

    async fn render(&self, document: &str) -> Result<Vec<u8>, SlideError> {
        if document.trim().is_empty() {
            return Err(SlideError::RenderFailed {
                detail: "document is empty".into(),
            });
        }
        Ok(document.as_bytes().to_vec())
    }
}

/// Renderer delegating to an external converter process.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    extension: String,
    timeout: Duration,
}

impl CommandRenderer {
    /// `program args…` must read markup on stdin and write the artifact to stdout.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        extension: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            extension: extension.into(),
            timeout,
        }
    }

    /// `wkhtmltopdf` producing a 1920×1080 page per slide.
    pub fn wkhtmltopdf(timeout: Duration) -> Self {
        let args = [
            "--quiet",
            "--page-width", "1920px",
            "--page-height", "1080px",
            "-T", "0", "-B", "0", "-L", "0", "-R", "0",
            "-", "-",
        ];
        Self::new(
            "wkhtmltopdf",
            args.iter().map(|a| a.to_string()).collect(),
            "pdf",
            timeout,
        )
    }

    async fn run(&self, markup: &str) -> Result<Vec<u8>, SlideError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SlideError::RenderFailed {
                detail: format!("could not start '{}': {}", self.program, e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            SlideError::Internal("renderer stdin was not captured".into())
        })?;
        let input = markup.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SlideError::RenderFailed {
                detail: format!("'{}' did not finish: {}", self.program, e),
            })?;

        writer
            .await
            .map_err(|e| SlideError::Internal(format!("renderer stdin task panicked: {e}")))?
            .map_err(|e| SlideError::RenderFailed {
                detail: format!("writing markup to '{}' failed: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlideError::RenderFailed {
                detail: format!("'{}' exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }
        if output.stdout.is_empty() {
            return Err(SlideError::RenderFailed {
                detail: format!("'{}' produced no output", self.program),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl DocumentRenderer for CommandRenderer {
    fn extension(&self) -> &str {
        &self.extension
    }

    async fn render(&self, document: &str) -> Result<Vec<u8>, SlideError> {
        let markup = normalise_markup(document);
        info!("Rendering {} bytes of markup with '{}'", markup.len(), self.program);
        let bytes = tokio::time::timeout(self.timeout, self.run(&markup))
            .await
            .map_err(|_| SlideError::RenderTimeout {
                secs: self.timeout.as_secs(),
            })??;
        debug!("Renderer produced {} bytes", bytes.len());
        Ok(bytes)
    }
}

// ── Markup normalisation ─────────────────────────────────────────────────
//
// Strict XHTML converters reject HTML5 void elements without a closing slash
// and bare ampersands. Both rules are idempotent.

static RE_VOID_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(meta|img|br|hr)(\s[^>]*?)?\s*/?>").unwrap());

static RE_AMPERSAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+;|#[xX][0-9a-fA-F]+;|[A-Za-z][A-Za-z0-9]*;)?").unwrap());

/// Self-close void elements and escape ampersands that do not start an entity.
pub fn normalise_markup(markup: &str) -> String {
    let s = RE_VOID_TAG.replace_all(markup, |caps: &regex::Captures<'_>| {
        let attrs = caps.get(2).map(|m| m.as_str().trim_end()).unwrap_or("");
        format!("<{}{} />", &caps[1], attrs)
    });
    let s = RE_AMPERSAND.replace_all(&s, |caps: &regex::Captures<'_>| {
        if caps.get(1).is_some() {
            caps[0].to_string()
        } else {
            "&amp;".to_string()
        }
    });
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_closes_void_tags() {
        assert_eq!(normalise_markup("<br>"), "<br />");
        assert_eq!(normalise_markup("<BR/>"), "<BR />");
        assert_eq!(
            normalise_markup(r#"<img src="a.png" alt="x">"#),
            r#"<img src="a.png" alt="x" />"#
        );
        assert_eq!(
            normalise_markup(r#"<meta charset="UTF-8" />"#),
            r#"<meta charset="UTF-8" />"#
        );
    }

    #[test]
    fn does_not_touch_lookalike_tags() {
        assert_eq!(normalise_markup("<header>x</header>"), "<header>x</header>");
        assert_eq!(normalise_markup("<metadata>"), "<metadata>");
    }

    #[test]
    fn escapes_bare_ampersands_only() {
        assert_eq!(
            normalise_markup("Tom & Jerry &amp; &lt;3 &#39; &#x27; a&b"),
            "Tom &amp; Jerry &amp; &lt;3 &#39; &#x27; a&amp;b"
        );
    }

    #[test]
    fn normalisation_is_idempotent() {
        let once = normalise_markup(r#"<p>A & B<br><img src="x?a=1&b=2"></p>"#);
        assert_eq!(normalise_markup(&once), once);
    }

    #[tokio::test]
    async fn html_renderer_passes_markup_through() {
        let bytes = HtmlRenderer.render("<p>hi</p>").await.unwrap();
        assert_eq!(bytes, b"<p>hi</p>");
        assert_eq!(HtmlRenderer.extension(), "html");
    }

    #[tokio::test]
    async fn html_renderer_rejects_empty_document() {
        assert!(matches!(
            HtmlRenderer.render("  ").await,
            Err(SlideError::RenderFailed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_converter_is_a_render_failure() {
        let r = CommandRenderer::new(
            "aislide-no-such-converter",
            vec![],
            "pdf",
            Duration::from_secs(5),
        );
        let err = r.render("<p>x</p>").await.unwrap_err();
        assert!(matches!(err, SlideError::RenderFailed { .. }), "got: {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_renderer_pipes_stdin_to_stdout() {
        let r = CommandRenderer::new("cat", vec![], "html", Duration::from_secs(5));
        let bytes = r.render("<p>A & B</p>").await.unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "<p>A &amp; B</p>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_render_failure() {
        let r = CommandRenderer::new("false", vec![], "pdf", Duration::from_secs(5));
        assert!(matches!(
            r.render("<p>x</p>").await,
            Err(SlideError::RenderFailed { .. })
        ));
    }
}
