//! # aislide
//!
//! Generate presentation decks from a topic using a text-completion model.
//!
//! ## Why this crate?
//!
//! A deck is produced as a background job that degrades instead of failing:
//! when the model is slow, unavailable or returns garbage, every stage falls
//! back to deterministic content. Only rendering the final document can end a
//! job in `Failed`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic, count
//!  │
//!  ├─ 1. Outline   validated {title, kind} plan of exactly `count` slides
//!  ├─ 2. Content   sanitized HTML body per slide
//!  ├─ 3. Images    keywords → search → stock photo (Image slides, capped)
//!  ├─ 4. Assemble  one self-contained 1920×1080 HTML document
//!  ├─ 5. Render    HTML passthrough or an external HTML→PDF converter
//!  └─ 6. Save      artifact store → job Completed { artifact }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aislide::{
//!     FsArtifactStore, GenerationConfig, HtmlRenderer, JobStore, MemoryJobStore,
//!     PoolConfig, SlideGenerator, WorkerPool,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / EDGEQUAKE_LLM_PROVIDER / …
//!     let config = GenerationConfig::default();
//!     let jobs = Arc::new(MemoryJobStore::new());
//!     let generator = Arc::new(SlideGenerator::from_config(
//!         &config,
//!         jobs.clone(),
//!         Arc::new(FsArtifactStore::new("uploads")),
//!         Arc::new(HtmlRenderer),
//!     ));
//!
//!     let pool = WorkerPool::start(generator, &PoolConfig::default())?;
//!     let id = jobs.create("AI in education", 6).await?;
//!     pool.submit(id.clone()).await?;
//!     pool.shutdown().await;
//!
//!     println!("{:?}", jobs.get(&id).await);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `aislide` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capability;
pub mod config;
pub mod error;
pub mod generate;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capability::{CompletionCapability, GoogleImageSearch, ImageSearch, LlmCompletion};
pub use config::{GenerationConfig, GenerationConfigBuilder, OverflowPolicy, PoolConfig};
pub use error::{CapabilityError, SlideError};
pub use generate::SlideGenerator;
pub use model::{Job, JobOutcome, JobStatus, PlanEntry, SlideFragment, SlideKind, SLIDE_COUNT_RANGE};
pub use pipeline::render::{CommandRenderer, DocumentRenderer, HtmlRenderer};
pub use pool::WorkerPool;
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use store::{ArtifactStore, FsArtifactStore, JobStore, MemoryJobStore};
