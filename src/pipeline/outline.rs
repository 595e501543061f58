//! Outline generation: an ordered, validated slide plan of exact length.
//!
//! The model proposes `{title, type}` pairs; everything after that is
//! deterministic validation. Whatever the model returns (nothing, garbage,
//! duplicates, forty image slides) the plan that comes out has exactly the
//! requested number of entries, at most [`MAX_IMAGE_SLIDES`] images, unique
//! digit-free titles of at most [`MAX_TITLE_CHARS`] characters.

use crate::capability::{complete_within, CompletionCapability};
use crate::model::{PlanEntry, SlideKind};
use crate::pipeline::markup::strip_code_fences;
use crate::prompts::outline_prompt;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest accepted slide title, in characters.
pub const MAX_TITLE_CHARS: usize = 45;

/// Most `Image` entries a plan may contain.
pub const MAX_IMAGE_SLIDES: usize = 4;

const FALLBACK_PLAN: &[(&str, SlideKind)] = &[
    ("How AI Is Changing Education", SlideKind::Title),
    ("Personalized Learning", SlideKind::Bullet),
    ("AI in the Classroom", SlideKind::Image),
    ("Supporting Teachers", SlideKind::Bullet),
    ("A Promising Future", SlideKind::Bullet),
    ("Learning Around the Clock", SlideKind::Image),
    ("Smart Analytics", SlideKind::Bullet),
    ("Boosting Engagement", SlideKind::Bullet),
    ("Start the Journey", SlideKind::Cta),
];

/// Generic bullet titles used to pad short plans, in order of preference.
const PADDING_TITLES: &[&str] = &[
    "Explore Further",
    "Key Takeaways",
    "Going Deeper",
    "Why It Matters",
    "Common Challenges",
    "Best Practices",
    "Lessons Learned",
    "Practical Tips",
    "Looking Ahead",
    "Open Questions",
    "Success Stories",
    "Getting It Right",
    "Tools of the Trade",
    "The Bigger Picture",
    "Myths and Facts",
    "What Experts Say",
    "Next Steps",
    "Quick Recap",
    "Food for Thought",
    "Final Thoughts",
];

const CTA_TITLES: &[&str] = &["Get Started Today!", "Take the First Step", "Join the Movement"];

#[derive(Deserialize)]
struct Candidate {
    title: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    kind: Option<String>,
}

/// Produces slide plans from a topic.
#[derive(Clone)]
pub struct OutlineGenerator {
    completion: Option<Arc<dyn CompletionCapability>>,
    timeout: Duration,
}

impl OutlineGenerator {
    pub fn new(completion: Option<Arc<dyn CompletionCapability>>, timeout: Duration) -> Self {
        Self {
            completion,
            timeout,
        }
    }

    /// Generate exactly `count` plan entries for `topic`. Never fails.
    pub async fn generate_plan(&self, topic: &str, count: usize) -> Vec<PlanEntry> {
        let Some(ref completion) = self.completion else {
            info!("No completion capability; using fallback outline");
            return fallback_plan(count);
        };

        let raw = match complete_within(completion.as_ref(), &outline_prompt(topic, count), self.timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Outline completion failed ({}); using fallback outline", e);
                return fallback_plan(count);
            }
        };

        let candidates: Vec<Candidate> = match serde_json::from_str(&strip_code_fences(&raw)) {
            Ok(c) => c,
            Err(e) => {
                warn!("Outline is not a JSON array ({}); using fallback outline", e);
                return fallback_plan(count);
            }
        };

        debug!("Outline: {} candidates for {} slides", candidates.len(), count);
        validate_plan(candidates, count)
    }
}

/// The fixed fallback plan, truncated to `count` and padded when `count`
/// exceeds its length.
pub fn fallback_plan(count: usize) -> Vec<PlanEntry> {
    let mut plan: Vec<PlanEntry> = FALLBACK_PLAN
        .iter()
        .take(count)
        .map(|(title, kind)| PlanEntry::new(*title, *kind))
        .collect();
    pad_plan(&mut plan, count);
    plan
}

fn validate_plan(candidates: Vec<Candidate>, count: usize) -> Vec<PlanEntry> {
    let mut plan: Vec<PlanEntry> = Vec::with_capacity(count);
    let mut images = 0usize;

    for candidate in candidates {
        if plan.len() >= count {
            break;
        }
        let title = candidate.title.as_deref().unwrap_or("").trim();
        if !is_valid_title(title) || plan.iter().any(|e| e.title == title) {
            continue;
        }
        let kind = SlideKind::parse_lenient(candidate.kind.as_deref().unwrap_or(""));
        if kind == SlideKind::Image {
            if images >= MAX_IMAGE_SLIDES {
                continue;
            }
            images += 1;
        }
        plan.push(PlanEntry::new(title, kind));
    }

    pad_plan(&mut plan, count);
    plan
}

fn is_valid_title(title: &str) -> bool {
    !title.is_empty()
        && title.chars().count() <= MAX_TITLE_CHARS
        && !title.chars().any(|c| c.is_numeric())
}

/// Pad with generic bullets up to `count - 1`, then one call-to-action.
fn pad_plan(plan: &mut Vec<PlanEntry>, count: usize) {
    let mut used: HashSet<String> = plan.iter().map(|e| e.title.clone()).collect();

    while plan.len() + 1 < count {
        let title = next_unused(PADDING_TITLES, &used);
        used.insert(title.clone());
        plan.push(PlanEntry::new(title, SlideKind::Bullet));
    }
    if plan.len() < count {
        let title = next_unused(CTA_TITLES, &used);
        plan.push(PlanEntry::new(title, SlideKind::Cta));
    }
}

/// First title in `pool` not yet used. When every pool title is taken the
/// first one is extended with "More" until it is unique.
fn next_unused(pool: &[&str], used: &HashSet<String>) -> String {
    if let Some(title) = pool.iter().find(|t| !used.contains(**t)) {
        return title.to_string();
    }
    let mut title = pool[0].to_string();
    while used.contains(&title) {
        title.push_str(" More");
    }
    title
}
