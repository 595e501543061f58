//! Error types for the aislide library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SlideError`] is **terminal**: the request or job cannot proceed (bad
//!   topic, missing job record, rendering or artifact storage failed). A job
//!   that hits one of these during generation ends in `Failed`.
//!
//! * [`CapabilityError`] is **recoverable by fallback**: a single call to the
//!   completion or image-search capability failed. These never escape a
//!   pipeline stage; each stage swaps in a deterministic substitute and the
//!   job keeps going.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::JobStatus;

/// All terminal errors returned by the aislide library.
#[derive(Debug, Error)]
pub enum SlideError {
    // ── Request errors ────────────────────────────────────────────────────
    /// Topic was empty or whitespace only.
    #[error("Topic must not be empty")]
    InvalidTopic,

    /// Requested slide count is outside the supported range.
    #[error("Slide count {count} is out of range (must be {min}–{max})")]
    SlideCountOutOfRange { count: usize, min: usize, max: usize },

    // ── Job store errors ──────────────────────────────────────────────────
    /// No job record exists for the id.
    #[error("Job '{job_id}' not found")]
    JobNotFound { job_id: String },

    /// The job already reached a terminal state and cannot change again.
    #[error("Job '{job_id}' is already {status} and cannot be updated")]
    JobAlreadyFinal { job_id: String, status: JobStatus },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// The rendering collaborator rejected the document.
    #[error("Rendering failed: {detail}")]
    RenderFailed { detail: String },

    /// The rendering collaborator did not finish in time.
    #[error("Rendering timed out after {secs}s")]
    RenderTimeout { secs: u64 },

    // ── Artifact errors ───────────────────────────────────────────────────
    /// Could not write the rendered artifact.
    #[error("Failed to write artifact '{path}': {source}")]
    ArtifactWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No artifact with that filename exists.
    #[error("Artifact '{filename}' not found")]
    ArtifactNotFound { filename: String },

    /// Filename is empty or tries to escape the upload directory.
    #[error("Invalid artifact name '{filename}'")]
    InvalidArtifactName { filename: String },

    // ── Worker pool errors ────────────────────────────────────────────────
    /// The work queue is saturated and the pool rejects new jobs.
    #[error("Work queue is full ({capacity} jobs waiting)")]
    QueueFull { capacity: usize },

    /// The pool has been shut down.
    #[error("Worker pool is closed")]
    PoolClosed,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed call to an external capability.
///
/// Every pipeline stage converts this into a fallback; it is never stored on
/// a job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CapabilityError {
    /// The capability has no provider or credentials configured.
    #[error("{capability} is not configured")]
    NotConfigured { capability: &'static str },

    /// The call exceeded its timeout.
    #[error("{capability} timed out after {secs}s")]
    Timeout { capability: &'static str, secs: u64 },

    /// Transport, auth or API error.
    #[error("{capability} request failed: {detail}")]
    Request {
        capability: &'static str,
        detail: String,
    },

    /// The call succeeded but returned nothing usable.
    #[error("{capability} returned an empty response")]
    EmptyResponse { capability: &'static str },
}
