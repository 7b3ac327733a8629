//! Pushes fresh question state to subscribed connections after writes.

use super::hub::{events, PushChannel};
use super::registry::GroupKey;
use crate::metrics::PushMetrics;
use parking_lot::{Mutex, RwLock};
use qanda_config::RealtimeConfig;
use qanda_core::QuestionId;
use qanda_repository::QuestionRepository;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

/// Receives "question changed" notifications from write paths.
///
/// Implementations must return immediately and never fail the caller.
#[cfg_attr(test, mockall::automock)]
pub trait UpdateNotifier: Send + Sync {
    /// Announces that the stored state of `id` changed.
    fn notify_question_updated(&self, id: QuestionId);
}

/// Fan-out of question updates over a fixed set of worker tasks.
///
/// A question always maps to the same worker, and each worker handles its
/// queue in order, so pushes for one question leave in write order. Workers
/// re-load the question from the repository and send it as
/// `ReceiveQuestion` to the question's group as it stands at that moment.
pub struct BroadcastDispatcher {
    shards: RwLock<Vec<mpsc::Sender<QuestionId>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl BroadcastDispatcher {
    /// Spawns the workers. Must be called inside a Tokio runtime.
    pub fn start<R>(config: &RealtimeConfig, repository: Arc<R>, channel: Arc<dyn PushChannel>) -> Self
    where
        R: QuestionRepository + ?Sized + 'static,
    {
        let shard_count = config.dispatch_shards.max(1);
        let queue = config.dispatch_queue.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        let mut workers = Vec::with_capacity(shard_count);

        for shard in 0..shard_count {
            let (tx, rx) = mpsc::channel(queue);
            let repository = Arc::clone(&repository);
            let channel = Arc::clone(&channel);
            let handle = tokio::spawn(
                run_shard(rx, repository, channel)
                    .instrument(tracing::info_span!("dispatch_worker", shard)),
            );
            shards.push(tx);
            workers.push(handle);
        }

        info!(shards = shard_count, queue_capacity = queue, "Broadcast dispatcher started");

        Self {
            shards: RwLock::new(shards),
            workers: Mutex::new(workers),
        }
    }

    /// Stops accepting notifications, lets workers drain their queues, and
    /// waits up to `timeout` for them to finish.
    pub async fn shutdown(&self, timeout: Duration) {
        let closed = std::mem::take(&mut *self.shards.write());
        if closed.is_empty() {
            return;
        }
        drop(closed);

        let workers = std::mem::take(&mut *self.workers.lock());
        info!(workers = workers.len(), "Waiting for dispatch workers to finish...");
        let drained = tokio::time::timeout(timeout, futures::future::join_all(workers)).await;
        if drained.is_err() {
            warn!(timeout_secs = timeout.as_secs(), "Dispatch workers did not finish in time");
        } else {
            info!("Broadcast dispatcher stopped");
        }
    }

    fn shard_for(id: QuestionId, shards: usize) -> usize {
        let shards = i64::try_from(shards).unwrap_or(i64::MAX);
        usize::try_from(id.into_inner().rem_euclid(shards)).unwrap_or(0)
    }
}

impl UpdateNotifier for BroadcastDispatcher {
    fn notify_question_updated(&self, id: QuestionId) {
        let shards = self.shards.read();
        if shards.is_empty() {
            debug!(question_id = %id, "Dispatcher stopped; update not pushed");
            PushMetrics::rejected("stopped");
            return;
        }
        let shard = Self::shard_for(id, shards.len());
        match shards[shard].try_send(id) {
            Ok(()) => debug!(question_id = %id, shard, "Queued question update"),
            Err(TrySendError::Full(_)) => {
                warn!(question_id = %id, shard, "Dispatch queue full; update not pushed");
                PushMetrics::rejected("queue_full");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(question_id = %id, shard, "Dispatch worker gone; update not pushed");
                PushMetrics::rejected("closed");
            }
        }
    }
}

impl std::fmt::Debug for BroadcastDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastDispatcher")
            .field("shards", &self.shards.read().len())
            .finish_non_exhaustive()
    }
}

async fn run_shard<R>(
    mut rx: mpsc::Receiver<QuestionId>,
    repository: Arc<R>,
    channel: Arc<dyn PushChannel>,
) where
    R: QuestionRepository + ?Sized,
{
    while let Some(id) = rx.recv().await {
        dispatch(id, repository.as_ref(), channel.as_ref()).await;
    }
}

async fn dispatch<R>(id: QuestionId, repository: &R, channel: &dyn PushChannel)
where
    R: QuestionRepository + ?Sized,
{
    let started = Instant::now();
    let question = match repository.get_question(id).await {
        Ok(Some(question)) => question,
        Ok(None) => {
            debug!(question_id = %id, "Question no longer exists; nothing to push");
            return;
        }
        Err(e) => {
            error!(question_id = %id, error = %e, "Failed to load question for push");
            PushMetrics::dispatch_error();
            return;
        }
    };

    let payload = match serde_json::to_value(&question) {
        Ok(payload) => payload,
        Err(e) => {
            error!(question_id = %id, error = %e, "Failed to encode question for push");
            PushMetrics::dispatch_error();
            return;
        }
    };

    let group = GroupKey::question(id);
    let report = channel.send_to_group(group, events::RECEIVE_QUESTION, &payload);
    PushMetrics::dispatch_duration(started.elapsed());
    debug!(
        question_id = %id,
        group = %group,
        delivered = report.delivered,
        dropped = report.dropped,
        pruned = report.pruned,
        "Pushed question update"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::ConnectionHub;
    use qanda_core::{Identity, NewAnswer, NewQuestion};
    use qanda_repository::InMemoryQuestionRepository;

    fn config(shards: usize) -> RealtimeConfig {
        RealtimeConfig {
            dispatch_shards: shards,
            dispatch_queue: 64,
            ..RealtimeConfig::default()
        }
    }

    async fn seeded() -> (Arc<InMemoryQuestionRepository>, QuestionId) {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let alice = Identity::new("auth0|alice", "alice");
        for i in 0..5 {
            repo.create_question(NewQuestion::new(format!("Q{i}"), "body", &alice))
                .await
                .unwrap();
        }
        (repo, QuestionId(5))
    }

    #[test]
    fn test_shard_is_stable_per_question() {
        assert_eq!(BroadcastDispatcher::shard_for(QuestionId(9), 4), 1);
        assert_eq!(BroadcastDispatcher::shard_for(QuestionId(9), 4), 1);
        assert_eq!(BroadcastDispatcher::shard_for(QuestionId(-3), 4), 1);
        assert_eq!(BroadcastDispatcher::shard_for(QuestionId(9), 1), 0);
    }

    #[tokio::test]
    async fn test_members_receive_exactly_one_push() {
        let (repo, id) = seeded().await;
        let hub = Arc::new(ConnectionHub::new(8));
        let dispatcher = BroadcastDispatcher::start(&config(2), Arc::clone(&repo), hub.clone());

        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        let (_c, mut rx_c) = hub.connect();
        hub.subscribe(a, id);
        hub.subscribe(b, id);

        dispatcher.notify_question_updated(id);
        dispatcher.shutdown(Duration::from_secs(5)).await;

        for rx in [&mut rx_a, &mut rx_b] {
            let push = rx.try_recv().unwrap();
            assert_eq!(push.event, events::RECEIVE_QUESTION);
            assert_eq!(push.payload["questionId"], 5);
            assert_eq!(push.payload["title"], "Q4");
            assert!(rx.try_recv().is_err());
        }
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_pushes_follow_write_order() {
        let (repo, id) = seeded().await;
        let hub = Arc::new(ConnectionHub::new(32));
        let dispatcher = BroadcastDispatcher::start(&config(4), Arc::clone(&repo), hub.clone());
        let (a, mut rx) = hub.connect();
        hub.subscribe(a, id);

        let bob = Identity::new("auth0|bob", "bob");
        for i in 1..=5 {
            repo.create_answer(NewAnswer::new(id, format!("answer {i}"), &bob))
                .await
                .unwrap();
            dispatcher.notify_question_updated(id);
        }
        dispatcher.shutdown(Duration::from_secs(5)).await;

        let mut seen = Vec::new();
        while let Ok(push) = rx.try_recv() {
            seen.push(push.payload["answers"].as_array().map_or(0, Vec::len));
        }
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&5));
    }

    #[tokio::test]
    async fn test_late_joiner_misses_earlier_push() {
        let (repo, id) = seeded().await;
        let hub = Arc::new(ConnectionHub::new(8));
        let dispatcher = BroadcastDispatcher::start(&config(1), Arc::clone(&repo), hub.clone());

        dispatcher.notify_question_updated(id);
        dispatcher.shutdown(Duration::from_secs(5)).await;

        let (late, mut rx) = hub.connect();
        hub.subscribe(late, id);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_question_pushes_nothing() {
        let repo = Arc::new(InMemoryQuestionRepository::new());
        let hub = Arc::new(ConnectionHub::new(8));
        let dispatcher = BroadcastDispatcher::start(&config(1), repo, hub.clone());
        let (a, mut rx) = hub.connect();
        hub.subscribe(a, QuestionId(99));

        dispatcher.notify_question_updated(QuestionId(99));
        dispatcher.shutdown(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notify_after_shutdown_is_ignored() {
        let (repo, id) = seeded().await;
        let hub = Arc::new(ConnectionHub::new(8));
        let dispatcher = BroadcastDispatcher::start(&config(2), repo, hub.clone());
        dispatcher.shutdown(Duration::from_secs(5)).await;

        dispatcher.notify_question_updated(id);
        dispatcher.shutdown(Duration::from_secs(5)).await;
    }
}
