//! Per-job orchestration: plan → bodies → images → assemble → render → save.
//!
//! ```text
//! Processing ──ok──▶ Completed { artifact }
//!     │
//!     └──err──▶ Failed { error }
//! ```
//!
//! Every capability-backed stage degrades to a fallback, so only rendering
//! and artifact persistence can move a job to `Failed`.

use crate::capability::{resolve_completion, resolve_image_search};
use crate::config::GenerationConfig;
use crate::error::SlideError;
use crate::model::{Job, JobOutcome, SlideFragment, SlideKind};
use crate::pipeline::assemble::assemble;
use crate::pipeline::content::ContentGenerator;
use crate::pipeline::image::ImageResolver;
use crate::pipeline::keywords::KeywordExtractor;
use crate::pipeline::outline::{fallback_plan, OutlineGenerator};
use crate::pipeline::render::DocumentRenderer;
use crate::progress::{NoopProgressCallback, ProgressCallback};
use crate::store::{ArtifactStore, JobStore};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Runs the full pipeline for one job at a time.
///
/// Shared between pool workers behind an `Arc`; it holds no per-job state.
pub struct SlideGenerator {
    outline: OutlineGenerator,
    content: ContentGenerator,
    images: ImageResolver,
    renderer: Arc<dyn DocumentRenderer>,
    jobs: Arc<dyn JobStore>,
    artifacts: Arc<dyn ArtifactStore>,
    max_images_per_job: usize,
    render_timeout: Duration,
    progress: ProgressCallback,
}

impl SlideGenerator {
    /// Wire the stages from `config`, resolving the completion and image
    /// search capabilities once. Either may be absent; the stages then run
    /// on their fallbacks.
    pub fn from_config(
        config: &GenerationConfig,
        jobs: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        let completion = resolve_completion(config);
        if completion.is_none() {
            warn!("No completion capability configured; every slide will use fallback content");
        }
        let search = resolve_image_search(config);
        let timeout = Duration::from_secs(config.api_timeout_secs);

        Self {
            outline: OutlineGenerator::new(completion.clone(), timeout),
            content: ContentGenerator::new(completion.clone(), timeout),
            images: ImageResolver::new(
                search,
                KeywordExtractor::new(completion, timeout),
                Duration::from_secs(config.search_timeout_secs),
            ),
            renderer,
            jobs,
            artifacts,
            max_images_per_job: config.max_images_per_job,
            render_timeout: Duration::from_secs(config.render_timeout_secs),
            progress: config
                .progress_callback
                .clone()
                .unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        }
    }

    pub fn jobs(&self) -> &Arc<dyn JobStore> {
        &self.jobs
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactStore> {
        &self.artifacts
    }

    /// Drive `job_id` to a terminal state and return the final job.
    ///
    /// A missing or already finished job is returned as an error without
    /// touching the store. Pipeline failures are recorded on the job, not
    /// returned.
    pub async fn run(&self, job_id: &str) -> Result<Job, SlideError> {
        let job = self
            .jobs
            .get(job_id)
            .await
            .ok_or_else(|| SlideError::JobNotFound {
                job_id: job_id.to_string(),
            })?;
        if job.status.is_terminal() {
            return Err(SlideError::JobAlreadyFinal {
                job_id: job.id,
                status: job.status,
            });
        }

        let start = Instant::now();
        info!(
            "Starting job {}: '{}' ({} slides)",
            job.id, job.topic, job.slide_count
        );

        let outcome = match self.generate(&job).await {
            Ok(artifact) => {
                info!(
                    "Job {} completed in {}ms: {}",
                    job.id,
                    start.elapsed().as_millis(),
                    artifact
                );
                self.progress.on_job_complete(&job.id, &artifact);
                JobOutcome::Completed { artifact }
            }
            Err(e) => {
                let message = e.to_string();
                error!("Job {} failed: {}", job.id, message);
                self.progress.on_job_failed(&job.id, &message);
                JobOutcome::Failed { error: message }
            }
        };

        self.jobs.update(&job.id, outcome).await
    }

    async fn generate(&self, job: &Job) -> Result<String, SlideError> {
        let mut plan = self.outline.generate_plan(&job.topic, job.slide_count).await;
        if plan.is_empty() {
            warn!("Empty plan for job {}; using fallback plan", job.id);
            plan = fallback_plan(job.slide_count);
        }

        let total = plan.len();
        self.progress.on_job_start(&job.id, total);

        let mut fragments = Vec::with_capacity(total);
        let mut image_count = 0;
        for (index, entry) in plan.iter().enumerate() {
            self.progress.on_slide_start(index, total, &entry.title);
            info!("Slide {}/{} [{}]: {}", index + 1, total, entry.kind, entry.title);

            let body = self
                .content
                .generate_body(&entry.title, entry.kind, &job.topic)
                .await;

            let image_url = if entry.kind == SlideKind::Image && image_count < self.max_images_per_job {
                image_count += 1;
                Some(self.images.resolve_image(&entry.title, &body).await)
            } else {
                None
            };

            self.progress
                .on_slide_complete(index, total, image_url.is_some());
            fragments.push(SlideFragment {
                title: entry.title.clone(),
                body,
                image_url,
            });
        }

        let document = assemble(&fragments);
        let bytes = tokio::time::timeout(self.render_timeout, self.renderer.render(&document))
            .await
            .map_err(|_| SlideError::RenderTimeout {
                secs: self.render_timeout.as_secs(),
            })??;
        self.artifacts
            .save(&job.id, &bytes, self.renderer.extension())
            .await
    }
}
