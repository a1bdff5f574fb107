use std::collections::HashMap;
use std::sync::Arc;

use cumulo_schema::{AuthHandshake, ChannelEvent, ConversationTurn};
use tokio::sync::{mpsc, RwLock};

/// Bidirectional push-messaging seam between a client session and the
/// hosting gateway. The client side opens a channel, authenticates, and
/// sends turns; everything coming back arrives on the event receiver.
#[async_trait::async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Opens a channel for the given client identity and returns its merged
    /// event stream. Replaces any prior channel under the same id.
    async fn open(&self, client_id: &str) -> anyhow::Result<mpsc::Receiver<ChannelEvent>>;

    /// Presents the credential handshake. The outcome arrives as a
    /// `ChannelEvent::Authenticated` on the open channel.
    async fn authenticate(&self, handshake: AuthHandshake) -> anyhow::Result<()>;

    /// Transmits one conversation turn. Callers must not send before a
    /// successful authentication.
    async fn send(&self, turn: ConversationTurn) -> anyhow::Result<()>;

    async fn close(&self, client_id: &str);
}

type Subscriber = mpsc::Sender<ChannelEvent>;

/// Unicast delivery of channel events, keyed by client id. Each logical
/// session registers exactly one receiver; replies are always addressed to
/// the one client that issued the request, never broadcast.
pub struct ClientBus {
    subscribers: Arc<RwLock<HashMap<String, Subscriber>>>,
    capacity: usize,
}

impl ClientBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Registers a client and returns its event receiver. A prior
    /// registration under the same id is replaced; its receiver goes dead.
    pub async fn register(&self, client_id: &str) -> mpsc::Receiver<ChannelEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().await;
        subs.insert(client_id.to_string(), tx);
        rx
    }

    pub async fn unregister(&self, client_id: &str) {
        let mut subs = self.subscribers.write().await;
        subs.remove(client_id);
    }

    /// Delivers an event to one client. Publishing to an id that is no
    /// longer registered is a no-op; a delayed weather follow-up racing a
    /// disconnect lands here.
    pub async fn publish_to(&self, client_id: &str, event: ChannelEvent) {
        publish(&self.subscribers, client_id, event).await;
    }

    /// A cloneable publish capability, handed to the gateway at
    /// construction instead of letting it reach for a shared channel handle.
    pub fn publisher(&self) -> ClientPublisher {
        ClientPublisher {
            subscribers: self.subscribers.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ClientPublisher {
    subscribers: Arc<RwLock<HashMap<String, Subscriber>>>,
}

impl ClientPublisher {
    pub async fn publish_to(&self, client_id: &str, event: ChannelEvent) {
        publish(&self.subscribers, client_id, event).await;
    }
}

async fn publish(
    subscribers: &RwLock<HashMap<String, Subscriber>>,
    client_id: &str,
    event: ChannelEvent,
) {
    let subs = subscribers.read().await;
    match subs.get(client_id) {
        Some(tx) => {
            if tx.try_send(event).is_err() {
                tracing::warn!(client_id, "dropping event for saturated or closed channel");
            }
        }
        None => {
            tracing::debug!(client_id, "no channel registered for client, event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cumulo_schema::{AssistantReply, AuthResult, ReplyOutput, TurnContext};
    use tokio::time::{timeout, Duration};

    fn reply_event(text: &str) -> ChannelEvent {
        ChannelEvent::Reply(Box::new(AssistantReply {
            intents: vec![],
            output: ReplyOutput {
                text: vec![text.to_string()],
            },
            context: TurnContext::default(),
        }))
    }

    #[tokio::test]
    async fn publish_to_absent_client_is_noop() {
        let bus = ClientBus::new(8);
        // Must not panic or error; there is simply nobody listening.
        bus.publish_to("ghost", reply_event("hello")).await;
    }

    #[tokio::test]
    async fn registered_client_receives_events() {
        let bus = ClientBus::new(8);
        let mut rx = bus.register("c1").await;

        bus.publish_to("c1", reply_event("hi")).await;

        let got = timeout(Duration::from_millis(100), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(got, ChannelEvent::Reply(_)));
    }

    #[tokio::test]
    async fn events_are_unicast() {
        let bus = ClientBus::new(8);
        let mut rx1 = bus.register("c1").await;
        let mut rx2 = bus.register("c2").await;

        bus.publish_to("c1", reply_event("for c1")).await;

        let got = timeout(Duration::from_millis(100), rx1.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(got, ChannelEvent::Reply(_)));
        assert!(timeout(Duration::from_millis(50), rx2.recv()).await.is_err());
    }

    #[tokio::test]
    async fn reregister_replaces_previous_receiver() {
        let bus = ClientBus::new(8);
        let mut old_rx = bus.register("c1").await;
        let mut new_rx = bus.register("c1").await;

        bus.publish_to(
            "c1",
            ChannelEvent::Authenticated(AuthResult {
                authenticated: true,
            }),
        )
        .await;

        let got = timeout(Duration::from_millis(100), new_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(got, ChannelEvent::Authenticated(_)));
        // Old receiver's sender was dropped on re-registration.
        assert!(timeout(Duration::from_millis(50), old_rx.recv())
            .await
            .map(|opt| opt.is_none())
            .unwrap_or(true));
    }

    #[tokio::test]
    async fn unregister_then_publish_is_noop() {
        let bus = ClientBus::new(8);
        let _rx = bus.register("c1").await;
        bus.unregister("c1").await;
        bus.publish_to("c1", reply_event("late")).await;
    }

    #[tokio::test]
    async fn publisher_handle_delivers() {
        let bus = ClientBus::new(8);
        let mut rx = bus.register("c1").await;
        let publisher = bus.publisher();

        publisher
            .publish_to(
                "c1",
                ChannelEvent::Disconnected {
                    reason: "transport error".into(),
                },
            )
            .await;

        let got = timeout(Duration::from_millis(100), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(got, ChannelEvent::Disconnected { .. }));
    }
}
