//! Live job notifications.
//!
//! An [`EventSubscriber`] owns at most one [`Subscription`]. Every subscription
//! gets a new generation number; events are applied under the state lock only
//! while their generation is current, so nothing from a torn-down or replaced
//! subscription can reach the state.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use reelcast_core::models::UploadSession;
use reelcast_core::{Backoff, JobObserver};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::{decode_event, topic_for, Decoded, NotificationEvent};
use crate::state::SessionState;
use crate::transport::BrokerTransport;

const DEFAULT_RECONNECT_BASE_MS: u64 = 500;
const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct Current {
    generation: u64,
    state: SessionState,
}

struct Shared {
    current: Mutex<Current>,
    snapshots: watch::Sender<SessionState>,
}

impl Shared {
    /// Apply `event` if `generation` is still current. Returns false once stale.
    fn apply(&self, generation: u64, event: NotificationEvent) -> bool {
        let mut current = lock(&self.current);
        if current.generation != generation {
            return false;
        }
        current.state.apply(event);
        self.snapshots.send_replace(current.state.clone());
        true
    }
}

/// Handle to one live connection task.
struct Subscription {
    job_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
        tracing::debug!(job_id = %self.job_id, "Subscription stopped");
    }
}

pub struct EventSubscriber<B> {
    transport: Arc<B>,
    shared: Arc<Shared>,
    subscription: Mutex<Option<Subscription>>,
    reconnect_base_ms: u64,
    reconnect_max_ms: u64,
}

impl<B: BrokerTransport> EventSubscriber<B> {
    pub fn new(transport: Arc<B>) -> Self {
        let (snapshots, _) = watch::channel(SessionState::default());
        Self {
            transport,
            shared: Arc::new(Shared {
                current: Mutex::new(Current::default()),
                snapshots,
            }),
            subscription: Mutex::new(None),
            reconnect_base_ms: DEFAULT_RECONNECT_BASE_MS,
            reconnect_max_ms: DEFAULT_RECONNECT_MAX_MS,
        }
    }

    pub fn with_reconnect_backoff(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.reconnect_base_ms = base_ms;
        self.reconnect_max_ms = max_ms;
        self
    }

    /// Follow `job_id`, replacing any previous subscription.
    ///
    /// The state is reset to an empty state for `job_id` before this returns.
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, job_id: &str) {
        let mut slot = lock(&self.subscription);
        if let Some(previous) = slot.take() {
            previous.stop();
        }

        let generation = {
            let mut current = lock(&self.shared.current);
            current.generation += 1;
            current.state = SessionState::for_job(job_id);
            self.shared.snapshots.send_replace(current.state.clone());
            current.generation
        };

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_subscription(
            self.transport.clone(),
            self.shared.clone(),
            topic_for(job_id),
            generation,
            cancel.clone(),
            Backoff::new(self.reconnect_base_ms, self.reconnect_max_ms),
        ));

        *slot = Some(Subscription {
            job_id: job_id.to_string(),
            cancel,
            task,
        });
        tracing::info!(job_id, "Subscribed to job notifications");
    }

    /// Stop routing events and release the connection. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        let mut slot = lock(&self.subscription);
        if let Some(subscription) = slot.take() {
            lock(&self.shared.current).generation += 1;
            subscription.stop();
        }
    }

    /// Job currently followed, if any.
    pub fn job_id(&self) -> Option<String> {
        lock(&self.subscription).as_ref().map(|s| s.job_id.clone())
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared.current).state.clone()
    }

    /// Receiver that sees a snapshot after every applied event, in broker order.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.shared.snapshots.subscribe()
    }
}

impl<B> Drop for EventSubscriber<B> {
    fn drop(&mut self) {
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.stop();
        }
    }
}

impl<B: BrokerTransport> JobObserver for EventSubscriber<B> {
    fn session_created(&self, session: &UploadSession) {
        self.subscribe(&session.job_id);
    }
}

async fn run_subscription<B: BrokerTransport>(
    transport: Arc<B>,
    shared: Arc<Shared>,
    topic: String,
    generation: u64,
    cancel: CancellationToken,
    mut backoff: Backoff,
) {
    loop {
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = transport.connect(&topic) => result,
        };

        match connected {
            Ok(mut messages) => {
                backoff.reset();
                tracing::debug!(topic = %topic, "Broker connection established");

                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return,
                        next = messages.next() => next,
                    };

                    match next {
                        Some(Ok(payload)) => match decode_event(&payload) {
                            Decoded::Event(event) => {
                                if !shared.apply(generation, event) {
                                    return;
                                }
                            }
                            Decoded::Malformed(reason) => {
                                tracing::debug!(
                                    topic = %topic,
                                    reason = %reason,
                                    "Discarded notification"
                                );
                            }
                        },
                        Some(Err(e)) => {
                            tracing::warn!(
                                topic = %topic,
                                error = %format!("{:#}", e),
                                "Broker stream failed"
                            );
                            break;
                        }
                        None => {
                            tracing::debug!(topic = %topic, "Broker closed the connection");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    topic = %topic,
                    error = %format!("{:#}", e),
                    "Failed to connect to broker"
                );
            }
        }

        let delay = backoff.next_delay();
        tracing::debug!(topic = %topic, "Reconnecting to broker in {:?}", delay);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
