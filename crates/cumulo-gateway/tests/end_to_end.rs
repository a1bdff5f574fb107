//! Full wiring: chat controller and session connection on the client side,
//! in-process gateway channel, gateway, stub intent engine, and a mocked
//! weather backend on the server side.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cumulo_bus::ClientBus;
use cumulo_gateway::{Gateway, GatewayChannel, IntentEngine, StaticTokenValidator};
use cumulo_schema::{AssistantReply, ConversationTurn, Intent, ReplyOutput};
use cumulo_session::{
    ChatController, ClientCredentials, SessionConnection, SessionError, SessionState,
};
use cumulo_weather::{WeatherApi, WeatherPipeline};
use tokio::time::timeout;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scripted engine: an empty turn greets, anything else asks for Austin's
/// weather. Context round-trips the way the hosted engine round-trips it.
struct ScriptedEngine;

#[async_trait]
impl IntentEngine for ScriptedEngine {
    async fn message(&self, turn: ConversationTurn) -> anyhow::Result<AssistantReply> {
        let mut context = turn.context;
        if turn.input.text.is_empty() {
            return Ok(AssistantReply {
                intents: vec![Intent {
                    intent: "greetings".into(),
                    confidence: 0.99,
                }],
                output: ReplyOutput {
                    text: vec!["Hi! Ask me about the weather.".to_string()],
                },
                context,
            });
        }

        context.weather_where = Some("Austin".into());
        Ok(AssistantReply {
            intents: vec![Intent {
                intent: "the-weather".into(),
                confidence: 0.98,
            }],
            output: ReplyOutput {
                text: vec!["Let me look that up.".to_string()],
            },
            context,
        })
    }
}

async fn start_weather_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/location/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": {
                "address": ["Austin, Texas, United States"],
                "latitude": [30.2672],
                "longitude": [-97.7431],
                "city": ["Austin"],
                "adminDistrict": ["TX"],
                "postalKey": ["78701:US"]
            }
        })))
        .mount(&server)
        .await;

    let today = chrono::Utc::now().format("%Y-%m-%d");
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/geocode/.+/forecast/daily/3day\.json$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "forecasts": [{
                "fcst_valid_local": format!("{today}T07:00:00+00:00"),
                "narrative": "Mostly sunny",
                "qpf": 0.0,
                "day": {"hi": 82.0}
            }]
        })))
        .mount(&server)
        .await;
    server
}

fn build_stack(weather: &MockServer, token: &str) -> ChatController {
    let bus = Arc::new(ClientBus::new(8));
    let gateway = Arc::new(Gateway::new(
        Arc::new(ScriptedEngine),
        WeatherPipeline::new(WeatherApi::new("wx-user", "wx-pass", weather.uri())),
        bus.publisher(),
        Duration::from_millis(50),
    ));
    let channel = Arc::new(GatewayChannel::new(
        bus,
        gateway,
        Arc::new(StaticTokenValidator::new("secret")),
    ));
    let connection = SessionConnection::new(
        channel,
        ClientCredentials {
            token: token.into(),
            user_id: "user-1".into(),
        },
    );
    let (ctrl, _transcript_rx, _visibility_rx) = ChatController::new(connection);
    ctrl
}

#[tokio::test]
async fn weather_question_yields_text_then_narrative() {
    let weather = start_weather_backend().await;
    let mut ctrl = build_stack(&weather, "secret");

    ctrl.add_human_utterance("what's the weather in Austin?")
        .await
        .unwrap();
    assert_eq!(ctrl.state(), SessionState::AwaitingReply);

    // Conversational acknowledgment replaces the placeholder.
    timeout(Duration::from_secs(2), ctrl.next_event())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ctrl.state(), SessionState::Authenticated);
    assert_eq!(ctrl.transcript().len(), 2);
    assert_eq!(ctrl.transcript()[1].text, "Let me look that up.");

    // The delayed narrative lands as its own transcript entry.
    timeout(Duration::from_secs(2), ctrl.next_event())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ctrl.transcript().len(), 3);
    let narrative = &ctrl.transcript()[2].text;
    assert!(
        narrative.starts_with("Weather in Austin, TX for "),
        "{narrative}"
    );
    assert!(narrative.ends_with("is Mostly sunny"), "{narrative}");
    assert!(ctrl.transcript().iter().all(|u| !u.is_placeholder));

    // A follow-up question is accepted once the reply cycle finished.
    ctrl.add_human_utterance("thanks!").await.unwrap();
    assert_eq!(ctrl.state(), SessionState::AwaitingReply);
}

#[tokio::test]
async fn first_show_greets_through_the_whole_stack() {
    let weather = start_weather_backend().await;
    let mut ctrl = build_stack(&weather, "secret");

    ctrl.set_state_show().await.unwrap();
    timeout(Duration::from_secs(2), ctrl.next_event())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(ctrl.transcript().len(), 1);
    assert_eq!(ctrl.transcript()[0].text, "Hi! Ask me about the weather.");
}

#[tokio::test]
async fn bad_token_is_rejected_end_to_end() {
    let weather = start_weather_backend().await;
    let mut ctrl = build_stack(&weather, "not-the-token");

    let err = ctrl.add_human_utterance("hello").await.unwrap_err();
    assert!(matches!(err, SessionError::AuthenticationFailed));
    assert_eq!(ctrl.state(), SessionState::Disconnected);
    // The failed attempt leaves only the human entry behind.
    assert_eq!(ctrl.transcript().len(), 1);
    assert_eq!(ctrl.transcript()[0].text, "hello");
}
