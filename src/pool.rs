//! Bounded background worker pool.
//!
//! Job ids are queued on a bounded channel and drained by a fixed number of
//! tokio tasks sharing one receiver. Each worker runs one job at a time, so
//! at most `workers` pipelines are in flight.

use crate::config::{OverflowPolicy, PoolConfig};
use crate::error::SlideError;
use crate::generate::SlideGenerator;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Handle to a running pool. Dropping it without [`WorkerPool::shutdown`]
/// closes the queue; workers still finish what was queued.
pub struct WorkerPool {
    sender: mpsc::Sender<String>,
    workers: Vec<JoinHandle<()>>,
    overflow: OverflowPolicy,
    capacity: usize,
}

impl WorkerPool {
    /// Validate `config` and spawn the workers. Must be called inside a
    /// tokio runtime.
    pub fn start(generator: Arc<SlideGenerator>, config: &PoolConfig) -> Result<Self, SlideError> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel::<String>(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers)
            .map(|worker| {
                let generator = Arc::clone(&generator);
                let receiver = Arc::clone(&receiver);
                tokio::spawn(worker_loop(worker, generator, receiver))
            })
            .collect();

        info!(
            "Worker pool started: {} workers, queue capacity {}, overflow {:?}",
            config.workers, config.queue_capacity, config.overflow
        );
        Ok(Self {
            sender,
            workers,
            overflow: config.overflow,
            capacity: config.queue_capacity,
        })
    }

    /// Queue a job for background generation.
    ///
    /// Returns once the id is queued, not when the job finishes.
    pub async fn submit(&self, job_id: impl Into<String>) -> Result<(), SlideError> {
        let job_id = job_id.into();
        match self.overflow {
            OverflowPolicy::Block => self
                .sender
                .send(job_id)
                .await
                .map_err(|_| SlideError::PoolClosed),
            OverflowPolicy::Reject => self.sender.try_send(job_id).map_err(|e| match e {
                mpsc::error::TrySendError::Full(id) => {
                    warn!("Queue full; rejecting job {}", id);
                    SlideError::QueueFull {
                        capacity: self.capacity,
                    }
                }
                mpsc::error::TrySendError::Closed(_) => SlideError::PoolClosed,
            }),
        }
    }

    /// Jobs currently waiting in the queue.
    pub fn queued(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Close the queue and wait until every queued job has been processed.
    pub async fn shutdown(self) {
        let Self {
            sender, workers, ..
        } = self;
        drop(sender);

        for result in join_all(workers).await {
            if let Err(e) = result {
                error!("Worker task ended abnormally: {}", e);
            }
        }
        info!("Worker pool drained");
    }
}

async fn worker_loop(
    worker: usize,
    generator: Arc<SlideGenerator>,
    receiver: Arc<Mutex<mpsc::Receiver<String>>>,
) {
    loop {
        // The lock is released before the job runs.
        let next = receiver.lock().await.recv().await;
        let Some(job_id) = next else {
            break;
        };

        debug!("Worker {} picked up job {}", worker, job_id);
        match generator.run(&job_id).await {
            Ok(job) => debug!("Worker {} finished job {} ({})", worker, job.id, job.status),
            Err(e) => warn!("Worker {} could not run job {}: {}", worker, job_id, e),
        }
    }
    debug!("Worker {} exiting", worker);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CompletionCapability;
    use crate::config::GenerationConfig;
    use crate::error::CapabilityError;
    use crate::model::JobStatus;
    use crate::pipeline::render::HtmlRenderer;
    use crate::store::{FsArtifactStore, JobStore, MemoryJobStore};

    struct Offline;

    #[async_trait::async_trait]
    impl CompletionCapability for Offline {
        async fn complete(&self, _prompt: &str) -> Result<String, CapabilityError> {
            Err(CapabilityError::EmptyResponse {
                capability: "completion",
            })
        }
    }

    fn generator(dir: &std::path::Path, jobs: Arc<MemoryJobStore>) -> Arc<SlideGenerator> {
        let config = GenerationConfig::builder()
            .completion(Arc::new(Offline))
            .build()
            .unwrap();
        Arc::new(SlideGenerator::from_config(
            &config,
            jobs,
            Arc::new(FsArtifactStore::new(dir)),
            Arc::new(HtmlRenderer),
        ))
    }

    #[tokio::test]
    async fn rejects_invalid_sizing() {
        let dir = tempfile::tempdir().unwrap();
        let gen = generator(dir.path(), Arc::new(MemoryJobStore::new()));
        let config = PoolConfig {
            workers: 6,
            ..Default::default()
        };
        assert!(matches!(
            WorkerPool::start(gen, &config),
            Err(SlideError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn shutdown_drains_queued_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = Arc::new(MemoryJobStore::new());
        let pool = WorkerPool::start(generator(dir.path(), Arc::clone(&jobs)), &PoolConfig::default())
            .unwrap();

        let mut ids = Vec::new();
        for topic in ["Solar power", "Ocean life", "Space travel"] {
            let id = jobs.create(topic, 5).await.unwrap();
            pool.submit(id.clone()).await.unwrap();
            ids.push(id);
        }
        pool.shutdown().await;

        for id in ids {
            let job = jobs.get(&id).await.unwrap();
            assert_eq!(job.status, JobStatus::Completed, "job {id}: {:?}", job.error);
        }
    }

    #[tokio::test]
    async fn unknown_job_does_not_stop_workers() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = Arc::new(MemoryJobStore::new());
        let pool = WorkerPool::start(
            generator(dir.path(), Arc::clone(&jobs)),
            &PoolConfig {
                workers: 1,
                ..Default::default()
            },
        )
        .unwrap();

        pool.submit("does-not-exist").await.unwrap();
        let id = jobs.create("Gardening", 5).await.unwrap();
        pool.submit(id.clone()).await.unwrap();
        pool.shutdown().await;

        assert_eq!(jobs.get(&id).await.unwrap().status, JobStatus::Completed);
    }
}
