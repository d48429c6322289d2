use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use reelcast_core::models::UploadSession;
use reelcast_core::JobObserver;
use reelcast_events::{BrokerTransport, EventSubscriber, MessageStream, SessionState};

type Sender = mpsc::UnboundedSender<anyhow::Result<String>>;

/// Broker whose connections are fed by the test.
#[derive(Default)]
struct ChannelBroker {
    senders: Mutex<HashMap<String, Sender>>,
    connects: Mutex<Vec<String>>,
    refuse: AtomicU32,
}

impl ChannelBroker {
    async fn sender(&self, topic: &str) -> Sender {
        for _ in 0..200 {
            if let Some(sender) = self.senders.lock().unwrap().get(topic) {
                return sender.clone();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no connection on {}", topic);
    }

    fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerTransport for ChannelBroker {
    async fn connect(&self, topic: &str) -> anyhow::Result<MessageStream> {
        self.connects.lock().unwrap().push(topic.to_string());
        if self.refuse.load(Ordering::SeqCst) > 0 {
            self.refuse.fetch_sub(1, Ordering::SeqCst);
            anyhow::bail!("connection refused");
        }
        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().unwrap().insert(topic.to_string(), tx);
        Ok(Box::pin(rx))
    }
}

fn send(sender: &Sender, payload: &str) {
    let _ = sender.unbounded_send(Ok(payload.to_string()));
}

async fn wait_until(
    subscriber: &EventSubscriber<ChannelBroker>,
    done: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    let mut rx = subscriber.watch();
    let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(done))
        .await
        .expect("timed out waiting for state")
        .expect("subscriber dropped")
        .clone();
    state
}

#[tokio::test]
async fn test_malformed_message_is_discarded() {
    let broker = Arc::new(ChannelBroker::default());
    let subscriber = EventSubscriber::new(broker.clone());
    subscriber.subscribe("42");

    let sender = broker.sender("logs:42").await;
    send(&sender, "{not json");
    send(&sender, r#"{"type":"status-update","status":"processing"}"#);

    let state = wait_until(&subscriber, |s| s.status.is_some()).await;
    assert_eq!(state.status.as_deref(), Some("processing"));
    assert!(state.messages.is_empty());
    assert_eq!(state.job_id.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_messages_keep_broker_order() {
    let broker = Arc::new(ChannelBroker::default());
    let subscriber = EventSubscriber::new(broker.clone());
    subscriber.subscribe("7");

    let sender = broker.sender("logs:7").await;
    for i in 0..5 {
        send(
            &sender,
            &format!(r#"{{"type":"log-message","message":"line {}"}}"#, i),
        );
    }

    let state = wait_until(&subscriber, |s| s.messages.len() == 5).await;
    assert_eq!(
        state.messages,
        vec!["line 0", "line 1", "line 2", "line 3", "line 4"]
    );
}

#[tokio::test]
async fn test_new_subscription_resets_state() {
    let broker = Arc::new(ChannelBroker::default());
    let subscriber = EventSubscriber::new(broker.clone());

    subscriber.subscribe("a");
    let sender_a = broker.sender("logs:a").await;
    send(&sender_a, r#"{"type":"log-message","message":"from a"}"#);
    wait_until(&subscriber, |s| s.messages.len() == 1).await;

    subscriber.subscribe("b");
    assert_eq!(subscriber.state(), SessionState::for_job("b"));
    assert_eq!(subscriber.job_id().as_deref(), Some("b"));

    send(&sender_a, r#"{"type":"status-update","status":"stale"}"#);
    let sender_b = broker.sender("logs:b").await;
    send(&sender_b, r#"{"type":"log-message","message":"from b"}"#);

    let state = wait_until(&subscriber, |s| !s.messages.is_empty()).await;
    assert_eq!(state.messages, vec!["from b"]);
    assert_eq!(state.status, None);
}

#[tokio::test]
async fn test_unsubscribe_stops_routing() {
    let broker = Arc::new(ChannelBroker::default());
    let subscriber = EventSubscriber::new(broker.clone());
    subscriber.subscribe("9");

    let sender = broker.sender("logs:9").await;
    send(&sender, r#"{"type":"status-update","status":"queued"}"#);
    wait_until(&subscriber, |s| s.status.is_some()).await;

    subscriber.unsubscribe();
    subscriber.unsubscribe();
    assert_eq!(subscriber.job_id(), None);

    send(&sender, r#"{"type":"status-update","status":"completed"}"#);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(subscriber.state().status.as_deref(), Some("queued"));
}

#[tokio::test]
async fn test_reconnects_after_refused_connection() {
    let broker = Arc::new(ChannelBroker {
        refuse: AtomicU32::new(2),
        ..ChannelBroker::default()
    });
    let subscriber = EventSubscriber::new(broker.clone()).with_reconnect_backoff(1, 5);
    subscriber.subscribe("3");

    let sender = broker.sender("logs:3").await;
    send(&sender, r#"{"type":"status-update","status":"completed"}"#);

    let state = wait_until(&subscriber, |s| s.is_finished()).await;
    assert_eq!(state.status.as_deref(), Some("completed"));
    assert_eq!(broker.connects().len(), 3);
}

#[tokio::test]
async fn test_observer_hook_subscribes_to_job() {
    let broker = Arc::new(ChannelBroker::default());
    let subscriber = EventSubscriber::new(broker.clone());

    subscriber.session_created(&UploadSession {
        session_id: "up-1".to_string(),
        storage_key: "k".to_string(),
        job_id: "55".to_string(),
        bucket: None,
    });

    assert_eq!(subscriber.job_id().as_deref(), Some("55"));
    broker.sender("logs:55").await;
    assert_eq!(broker.connects(), vec!["logs:55"]);
}
