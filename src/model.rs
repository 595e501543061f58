//! Domain types shared by every pipeline stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Accepted range for the requested number of slides.
pub const SLIDE_COUNT_RANGE: RangeInclusive<usize> = 5..=20;

/// Lifecycle status of a generation job.
///
/// Transitions are one-way: `Processing → Completed` or
/// `Processing → Failed`. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Processing => f.write_str("processing"),
            JobStatus::Completed => f.write_str("completed"),
            JobStatus::Failed => f.write_str("failed"),
        }
    }
}

/// A single deck-generation request and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub topic: String,
    pub slide_count: usize,
    pub status: JobStatus,
    /// Set only when `status == Completed`.
    pub artifact: Option<String>,
    /// Set only when `status == Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The single terminal transition applied to a job.
///
/// Encoding the outcome as an enum makes "artifact on failure" or
/// "error on success" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { artifact: String },
    Failed { error: String },
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Completed { .. } => JobStatus::Completed,
            JobOutcome::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Structural role of a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlideKind {
    Title,
    Bullet,
    Image,
    Cta,
}

impl SlideKind {
    /// Parse the `type` field of a model-produced outline entry.
    ///
    /// Matching is case-insensitive. Anything unrecognised is treated as a
    /// plain bullet slide.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TITLE" => SlideKind::Title,
            "IMAGE" => SlideKind::Image,
            "CTA" => SlideKind::Cta,
            _ => SlideKind::Bullet,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlideKind::Title => "TITLE",
            SlideKind::Bullet => "BULLET",
            SlideKind::Image => "IMAGE",
            SlideKind::Cta => "CTA",
        }
    }
}

impl fmt::Display for SlideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated entry of a slide plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub title: String,
    pub kind: SlideKind,
}

impl PlanEntry {
    pub fn new(title: impl Into<String>, kind: SlideKind) -> Self {
        Self {
            title: title.into(),
            kind,
        }
    }
}

/// The rendered unit for one plan entry, consumed by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideFragment {
    /// Raw title; the assembler escapes it.
    pub title: String,
    /// Sanitized HTML body.
    pub body: String,
    pub image_url: Option<String>,
}
