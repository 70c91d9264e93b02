//! Assignment Queue — bounded MPSC queue with a worker thread pool.
//!
//! Architecture:
//!   API layer stores the message → `on_message_created` → instant return
//!   N worker threads consume jobs → `AssignmentEngine::assign_message`
//!
//! The caller is acknowledged before assignment completes. If the queue is
//! full the job is dropped with a warning; the message keeps
//! topic_id = NULL and is picked up by `retry_unassigned`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::engine::assignment::{AssignmentEngine, AssignmentOutcome};
use crate::message::Message;
use crate::{TopicError, TopicResult};

/// One assignment pass to run in the background.
#[derive(Debug, Clone)]
pub struct AssignmentJob {
    pub message_id: String,
    pub user_id: String,
}

/// Live queue statistics, shared across workers.
pub struct QueueStats {
    pending: AtomicUsize,
    processed: AtomicU64,
    errors: AtomicU64,
    workers: usize,
}

impl QueueStats {
    fn new(workers: usize) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            processed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            workers,
        }
    }
}

/// Thread-safe assignment queue with worker pool.
pub struct AssignmentQueue {
    tx: SyncSender<AssignmentJob>,
    stats: Arc<QueueStats>,
    engine: Arc<AssignmentEngine>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl AssignmentQueue {
    /// Create the queue and spawn the consumer threads configured on the
    /// engine (`queue_workers`, `queue_capacity`).
    pub fn new(engine: Arc<AssignmentEngine>) -> Self {
        let num_workers = engine.config().queue_workers;
        let capacity = engine.config().queue_capacity;
        let (tx, rx) = sync_channel::<AssignmentJob>(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let stats = Arc::new(QueueStats::new(num_workers));
        let mut handles = Vec::with_capacity(num_workers);

        tracing::info!(workers = num_workers, capacity, "Assignment queue initialized");

        for worker_id in 0..num_workers {
            let rx = rx.clone();
            let engine = engine.clone();
            let stats = stats.clone();

            let handle = std::thread::Builder::new()
                .name(format!("assign-worker-{}", worker_id))
                .spawn(move || {
                    tracing::debug!(worker_id, "Assignment worker started");
                    worker_loop(worker_id, rx, engine, stats);
                    tracing::debug!(worker_id, "Assignment worker stopped");
                })
                .expect("Failed to spawn assignment worker thread");

            handles.push(handle);
        }

        Self {
            tx,
            stats,
            engine,
            worker_handles: Mutex::new(handles),
        }
    }

    /// Ingestion trigger: called by the API layer after it durably stored
    /// the message. Returns immediately; safe to call more than once for
    /// the same message id (the pass no-ops on re-runs).
    pub fn on_message_created(&self, message: &Message) -> Result<(), AssignmentJob> {
        self.submit(AssignmentJob {
            message_id: message.id.clone(),
            user_id: message.user_id.clone(),
        })
    }

    /// Submit a job without blocking. Err returns the job when the queue
    /// is full or shut down; the message stays unassigned.
    pub fn submit(&self, job: AssignmentJob) -> Result<(), AssignmentJob> {
        self.stats.pending.fetch_add(1, Ordering::Relaxed);
        match self.tx.try_send(job) {
            Ok(()) => {
                tracing::debug!("Assignment job queued");
                Ok(())
            }
            Err(std::sync::mpsc::TrySendError::Full(job)) => {
                self.stats.pending.fetch_sub(1, Ordering::Relaxed);
                tracing::warn!(
                    pending = self.stats.pending.load(Ordering::Relaxed),
                    user = %job.user_id,
                    "Assignment queue full, job dropped"
                );
                Err(job)
            }
            Err(std::sync::mpsc::TrySendError::Disconnected(job)) => {
                self.stats.pending.fetch_sub(1, Ordering::Relaxed);
                tracing::error!("Assignment queue disconnected, workers dead?");
                Err(job)
            }
        }
    }

    /// Retry sweep: re-submit every unassigned message of this user.
    /// Returns how many jobs were queued.
    pub fn retry_unassigned(&self, user_id: &str) -> TopicResult<usize> {
        let pending = self.engine.unassigned_messages(user_id)?;
        let mut queued = 0;
        for message in &pending {
            if self.on_message_created(message).is_ok() {
                queued += 1;
            }
        }
        if queued > 0 {
            tracing::info!(user = user_id, queued, "Retry sweep re-queued unassigned messages");
        }
        Ok(queued)
    }

    /// Current queue statistics.
    pub fn queue_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "pending": self.stats.pending.load(Ordering::Relaxed),
            "processed": self.stats.processed.load(Ordering::Relaxed),
            "errors": self.stats.errors.load(Ordering::Relaxed),
            "workers": self.stats.workers,
        })
    }

    /// Graceful shutdown: drop the sender (workers exit after draining),
    /// then join all worker threads.
    pub fn shutdown(self) {
        drop(self.tx);

        if let Ok(mut handles) = self.worker_handles.lock() {
            tracing::info!(count = handles.len(), "Waiting for assignment workers to finish");
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
            tracing::info!("All assignment workers stopped");
        }
    }
}

/// Worker loop: consume jobs from the shared receiver, run each pass.
fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<Receiver<AssignmentJob>>>,
    engine: Arc<AssignmentEngine>,
    stats: Arc<QueueStats>,
) {
    loop {
        // Lock the receiver briefly to grab one job.
        let job = {
            let rx_guard = match rx.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::error!(worker_id, "Receiver mutex poisoned, worker exiting");
                    return;
                }
            };
            match rx_guard.recv() {
                Ok(job) => job,
                Err(_) => {
                    tracing::debug!(worker_id, "Channel closed, worker exiting");
                    return;
                }
            }
        };

        stats.pending.fetch_sub(1, Ordering::Relaxed);
        let start = Instant::now();

        match engine.assign_message(&job.message_id) {
            Ok(AssignmentOutcome::AlreadyAssigned { topic_id }) => {
                stats.processed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    worker_id,
                    message = %job.message_id,
                    topic = %topic_id,
                    "Duplicate submission, pass no-oped"
                );
            }
            Ok(outcome) => {
                stats.processed.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    worker_id,
                    user = %job.user_id,
                    message = %job.message_id,
                    topic = %outcome.topic_id(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Assignment complete"
                );
            }
            Err(TopicError::TransientStore(reason)) => {
                // Retriable: the message keeps topic_id = NULL and the
                // sweep will pick it up.
                stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    worker_id,
                    user = %job.user_id,
                    message = %job.message_id,
                    error = %reason,
                    "Assignment failed retriably, message left unassigned"
                );
            }
            Err(e) => {
                stats.errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    worker_id,
                    user = %job.user_id,
                    message = %job.message_id,
                    error = %e,
                    "Assignment failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MessageStore;
    use crate::test_helpers::{engine_with_store, ingest};

    #[test]
    fn test_end_to_end_through_queue() {
        let (store, engine) = engine_with_store();
        let engine = Arc::new(engine);
        let queue = AssignmentQueue::new(engine.clone());

        for text in [
            "I need help with my invoice",
            "My invoice is wrong",
            "What's the weather today?",
        ] {
            let id = ingest(&store, "u1", text);
            let message = store.get_message(&id).unwrap().unwrap();
            queue.on_message_created(&message).unwrap();
        }

        // Drains the queue and joins the workers.
        queue.shutdown();

        let topics = engine.list_topics("u1").unwrap();
        assert_eq!(topics.len(), 2);
        assert!(engine.unassigned_messages("u1").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_submissions_no_op() {
        let (store, engine) = engine_with_store();
        let engine = Arc::new(engine);
        let queue = AssignmentQueue::new(engine.clone());

        let id = ingest(&store, "u1", "invoice billing question");
        let message = store.get_message(&id).unwrap().unwrap();
        queue.on_message_created(&message).unwrap();
        queue.on_message_created(&message).unwrap();
        queue.on_message_created(&message).unwrap();
        queue.shutdown();

        let topics = engine.list_topics("u1").unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].member_message_ids.len(), 1);
    }

    #[test]
    fn test_retry_unassigned_requeues() {
        let (store, engine) = engine_with_store();
        let engine = Arc::new(engine);
        let queue = AssignmentQueue::new(engine.clone());

        // Stored but never submitted: simulates a dropped job.
        ingest(&store, "u1", "invoice billing question");
        ingest(&store, "u1", "weather forecast tomorrow");

        let queued = queue.retry_unassigned("u1").unwrap();
        assert_eq!(queued, 2);
        queue.shutdown();

        assert!(engine.unassigned_messages("u1").unwrap().is_empty());
        assert_eq!(engine.list_topics("u1").unwrap().len(), 2);
    }

    #[test]
    fn test_queue_stats_shape() {
        let (_, engine) = engine_with_store();
        let queue = AssignmentQueue::new(Arc::new(engine));
        let stats = queue.queue_stats();
        assert_eq!(stats["workers"], 4);
        assert_eq!(stats["processed"], 0);
        queue.shutdown();
    }
}
