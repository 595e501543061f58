//! Job status store and artifact store.
//!
//! Both are traits so hosts can back them with a database or object storage.
//! The in-crate implementations cover single-process use: an in-memory job
//! table and an upload directory on the local file system.

use crate::error::SlideError;
use crate::model::{Job, JobOutcome, JobStatus, SLIDE_COUNT_RANGE};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

/// Key-value status store addressed by job id.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Validate the request and create a job in `Processing`.
    async fn create(&self, topic: &str, slide_count: usize) -> Result<String, SlideError>;

    async fn get(&self, job_id: &str) -> Option<Job>;

    /// Apply the single terminal transition. Rejects jobs already terminal.
    async fn update(&self, job_id: &str, outcome: JobOutcome) -> Result<Job, SlideError>;

    /// Most recently created jobs, newest first.
    async fn list_recent(&self, limit: usize) -> Vec<Job>;
}

/// Validate a generation request before a job is created.
pub fn validate_request(topic: &str, slide_count: usize) -> Result<(), SlideError> {
    if topic.trim().is_empty() {
        return Err(SlideError::InvalidTopic);
    }
    if !SLIDE_COUNT_RANGE.contains(&slide_count) {
        return Err(SlideError::SlideCountOutOfRange {
            count: slide_count,
            min: *SLIDE_COUNT_RANGE.start(),
            max: *SLIDE_COUNT_RANGE.end(),
        });
    }
    Ok(())
}

/// In-memory [`JobStore`].
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<String, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, topic: &str, slide_count: usize) -> Result<String, SlideError> {
        validate_request(topic, slide_count)?;
        let job = Job {
            id: Uuid::new_v4().to_string(),
            topic: topic.trim().to_string(),
            slide_count,
            status: JobStatus::Processing,
            artifact: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let id = job.id.clone();
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), job);
        debug!("Created job {}", id);
        Ok(id)
    }

    async fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }

    async fn update(&self, job_id: &str, outcome: JobOutcome) -> Result<Job, SlideError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let job = jobs.get_mut(job_id).ok_or_else(|| SlideError::JobNotFound {
            job_id: job_id.to_string(),
        })?;
        if job.status.is_terminal() {
            return Err(SlideError::JobAlreadyFinal {
                job_id: job_id.to_string(),
                status: job.status,
            });
        }

        job.status = outcome.status();
        match outcome {
            JobOutcome::Completed { artifact } => job.artifact = Some(artifact),
            JobOutcome::Failed { error } => job.error = Some(error),
        }
        job.completed_at = Some(Utc::now());
        Ok(job.clone())
    }

    async fn list_recent(&self, limit: usize) -> Vec<Job> {
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut recent: Vec<Job> = jobs.values().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        recent
    }
}

// ── Artifacts ────────────────────────────────────────────────────────────

/// Binary artifact persistence and retrieval by filename.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `bytes` as `<job_id>.<extension>` and return its public reference.
    async fn save(&self, job_id: &str, bytes: &[u8], extension: &str) -> Result<String, SlideError>;

    /// Read back an artifact by the filename part of its reference.
    async fn open(&self, filename: &str) -> Result<Vec<u8>, SlideError>;
}

/// Public path artifacts are served under.
pub const DEFAULT_DOWNLOAD_PREFIX: &str = "/api/slides/download/";

/// [`ArtifactStore`] writing into an upload directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
    download_prefix: String,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            download_prefix: DEFAULT_DOWNLOAD_PREFIX.to_string(),
        }
    }

    pub fn with_download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.download_prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path of a stored artifact, after validating the filename.
    pub fn path_of(&self, filename: &str) -> Result<PathBuf, SlideError> {
        check_filename(filename)?;
        Ok(self.dir.join(filename))
    }
}

/// A bare file name: no separators, no parent references, not hidden.
fn check_filename(filename: &str) -> Result<(), SlideError> {
    let bad = filename.is_empty()
        || filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
        || filename.contains("..");
    if bad {
        return Err(SlideError::InvalidArtifactName {
            filename: filename.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn save(&self, job_id: &str, bytes: &[u8], extension: &str) -> Result<String, SlideError> {
        let filename = format!("{job_id}.{extension}");
        let path = self.path_of(&filename)?;
        let write_err = |source| SlideError::ArtifactWriteFailed {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        // Atomic write: temp file, then rename
        let tmp_path = self.dir.join(format!(".{filename}.tmp"));
        let written = match tokio::fs::write(&tmp_path, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        info!("Saved artifact {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("{}{}", self.download_prefix, filename))
    }

    async fn open(&self, filename: &str) -> Result<Vec<u8>, SlideError> {
        let path = self.path_of(filename)?;
        tokio::fs::read(&path).await.map_err(|_| SlideError::ArtifactNotFound {
            filename: filename.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_validates_request() {
        let store = MemoryJobStore::new();
        assert!(matches!(store.create("  ", 6).await, Err(SlideError::InvalidTopic)));
        assert!(matches!(
            store.create("AI", 4).await,
            Err(SlideError::SlideCountOutOfRange { count: 4, .. })
        ));
        assert!(matches!(
            store.create("AI", 21).await,
            Err(SlideError::SlideCountOutOfRange { count: 21, .. })
        ));
    }

    #[tokio::test]
    async fn new_job_is_processing() {
        let store = MemoryJobStore::new();
        let id = store.create("  AI in education ", 6).await.unwrap();
        let job = store.get(&id).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.topic, "AI in education");
        assert!(job.artifact.is_none() && job.error.is_none() && job.completed_at.is_none());
    }

    #[tokio::test]
    async fn terminal_transition_happens_once() {
        let store = MemoryJobStore::new();
        let id = store.create("AI", 5).await.unwrap();
        let done = store
            .update(&id, JobOutcome::Completed { artifact: "/a.pdf".into() })
            .await
            .unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.completed_at.is_some());

        let err = store
            .update(&id, JobOutcome::Failed { error: "late".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, SlideError::JobAlreadyFinal { status: JobStatus::Completed, .. }));
        let job = store.get(&id).await.unwrap();
        assert!(job.error.is_none());
    }

    #[tokio::test]
    async fn update_unknown_job() {
        let store = MemoryJobStore::new();
        let err = store
            .update("nope", JobOutcome::Failed { error: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, SlideError::JobNotFound { .. }));
    }

    #[tokio::test]
    async fn list_recent_is_newest_first() {
        let store = MemoryJobStore::new();
        let mut ids = Vec::new();
        for topic in ["one", "two", "three"] {
            ids.push(store.create(topic, 5).await.unwrap());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        let recent = store.list_recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, ids[2]);
        assert_eq!(recent[1].id, ids[1]);
    }

    #[tokio::test]
    async fn artifact_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("uploads"));
        let reference = store.save("job-1", b"%PDF-1.7", "pdf").await.unwrap();
        assert_eq!(reference, "/api/slides/download/job-1.pdf");
        assert_eq!(store.open("job-1.pdf").await.unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        // A non-empty directory in the way makes the final rename fail.
        let blocker = dir.path().join("job-1.pdf");
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("keep"), b"x").unwrap();

        let err = store.save("job-1", b"%PDF-1.7", "pdf").await.unwrap_err();
        assert!(matches!(err, SlideError::ArtifactWriteFailed { .. }));
        assert!(!dir.path().join(".job-1.pdf.tmp").exists());
        assert!(blocker.is_dir());
    }

    #[tokio::test]
    async fn artifact_names_cannot_escape_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        for name in ["../secret", "a/b.pdf", "", ".hidden", "..\\x"] {
            assert!(
                matches!(store.open(name).await, Err(SlideError::InvalidArtifactName { .. })),
                "{name:?} accepted"
            );
        }
        assert!(matches!(
            store.open("missing.pdf").await,
            Err(SlideError::ArtifactNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn custom_download_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path()).with_download_prefix("file:///decks/");
        let reference = store.save("j", b"x", "html").await.unwrap();
        assert_eq!(reference, "file:///decks/j.html");
    }
}
