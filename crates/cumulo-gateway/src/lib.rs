pub mod config;
pub mod engine;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use cumulo_bus::ClientPublisher;
use cumulo_schema::{AssistantReply, ChannelEvent, ConversationTurn};
use cumulo_weather::{WeatherApi, WeatherPipeline};
use uuid::Uuid;

pub use config::{AssistantConfig, GatewayConfig, WeatherApiConfig};
pub use engine::{AssistantHttpClient, IntentEngine};
pub use transport::{GatewayChannel, StaticTokenValidator, TokenValidator};

/// Intents that carry (or update) a weather request.
pub const INTENT_WEATHER: &str = "the-weather";
pub const INTENT_CHANGE_PARAMS: &str = "change-in-params";

/// Synchronous acknowledgment of an accepted turn. Processing continues in
/// a spawned task; completion is only observable through the channel events
/// addressed back to the originating client.
#[derive(Debug, Clone, Copy)]
pub struct TurnAccepted {
    pub trace_id: Uuid,
}

/// Server-side glue between the channels, the intent engine, and the
/// weather pipeline. Holds a publish capability rather than reaching into
/// any shared channel state; every relay is unicast to the client id the
/// turn carried in its context.
pub struct Gateway {
    engine: Arc<dyn IntentEngine>,
    weather: WeatherPipeline,
    publisher: ClientPublisher,
    followup_delay: Duration,
}

impl Gateway {
    pub fn new(
        engine: Arc<dyn IntentEngine>,
        weather: WeatherPipeline,
        publisher: ClientPublisher,
        followup_delay: Duration,
    ) -> Self {
        Self {
            engine,
            weather,
            publisher,
            followup_delay,
        }
    }

    /// Builds the production wiring: HTTP intent engine plus HTTP weather
    /// pipeline, both from the environment-derived configuration.
    pub fn from_config(config: &GatewayConfig, publisher: ClientPublisher) -> Self {
        let engine = Arc::new(AssistantHttpClient::new(&config.assistant));
        let api = WeatherApi::new(
            &config.weather.username,
            &config.weather.password,
            &config.weather.base_url,
        );
        Self::new(
            engine,
            WeatherPipeline::new(api),
            publisher,
            config.followup_delay,
        )
    }

    /// Accepts one inbound turn. Returns immediately; the intent-engine
    /// round trip and any weather follow-up run in a spawned task.
    pub fn accept(self: &Arc<Self>, turn: ConversationTurn) -> TurnAccepted {
        let trace_id = Uuid::new_v4();
        let gateway = self.clone();
        tokio::spawn(async move {
            gateway.process(turn, trace_id).await;
        });
        TurnAccepted { trace_id }
    }

    async fn process(self: Arc<Self>, turn: ConversationTurn, trace_id: Uuid) {
        let sender_id = turn.context.client_id.clone();
        tracing::debug!(%trace_id, text = %turn.input.text, "forwarding turn to intent engine");

        let reply = match self.engine.message(turn).await {
            Ok(reply) => reply,
            Err(err) => {
                // Deliberate policy: the client sees neither a reply nor an
                // error for upstream engine failures.
                tracing::error!(%trace_id, %err, "intent engine failed, dropping turn");
                return;
            }
        };

        let Some(client_id) = reply.context.client_id.clone().or(sender_id) else {
            tracing::warn!(%trace_id, "reply carries no client id, nowhere to address it");
            return;
        };

        let top = reply.top_intent().unwrap_or_default().to_string();
        if top == INTENT_WEATHER || top == INTENT_CHANGE_PARAMS {
            tracing::debug!(%trace_id, intent = %top, "relaying weather-intent reply");
            let wants_followup = reply.context.weather_where.is_some();
            self.relay(&client_id, reply.clone()).await;

            if wants_followup {
                let gateway = self.clone();
                tokio::spawn(async move {
                    // Fixed wait so the conversational text renders before
                    // the narrative; a disconnect in the meantime turns the
                    // second relay into a no-op.
                    tokio::time::sleep(gateway.followup_delay).await;
                    gateway.weather_followup(reply, client_id, trace_id).await;
                });
            }
        } else {
            self.relay(&client_id, reply).await;
        }
    }

    async fn weather_followup(&self, mut reply: AssistantReply, client_id: String, trace_id: Uuid) {
        let narrative = match self.weather.resolve(&mut reply.context).await {
            Ok(narrative) => narrative,
            Err(err) => match err.user_sentence() {
                Some(sentence) => sentence,
                None => {
                    tracing::error!(%trace_id, %err, "weather pipeline failed, dropping follow-up");
                    return;
                }
            },
        };

        reply.output.text = vec![narrative];
        self.relay(&client_id, reply).await;
    }

    async fn relay(&self, client_id: &str, reply: AssistantReply) {
        self.publisher
            .publish_to(client_id, ChannelEvent::Reply(Box::new(reply)))
            .await;
    }
}
