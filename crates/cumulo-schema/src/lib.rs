use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Human,
    Assistant,
}

/// One transcript entry. Placeholders are transient assistant entries shown
/// while a reply is pending; at most one exists at a time and it is always
/// the most recent entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default)]
    pub render_as_markup: bool,
    #[serde(default)]
    pub is_placeholder: bool,
}

impl Utterance {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
            render_as_markup: false,
            is_placeholder: false,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            render_as_markup: false,
            is_placeholder: false,
        }
    }

    /// The "typing" entry appended while a reply is in flight.
    pub fn placeholder() -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: "…".to_string(),
            render_as_markup: true,
            is_placeholder: true,
        }
    }
}

/// Context blob carried across turns. The named fields are the ones the
/// gateway and weather pipeline act on; everything else the intent engine
/// stores in it round-trips untouched through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_where: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_when: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_what: Option<String>,
    /// Clock time as "HH:MM:SS"; replaced by a day-period label during
    /// pipeline classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_time: Option<String>,
    #[serde(default)]
    pub weather_activity: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnInput {
    pub text: String,
}

/// One outbound chat turn from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub input: TurnInput,
    pub context: TurnContext,
}

impl ConversationTurn {
    pub fn new(text: impl Into<String>, context: TurnContext) -> Self {
        Self {
            input: TurnInput { text: text.into() },
            context,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub intent: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyOutput {
    #[serde(default)]
    pub text: Vec<String>,
}

/// Structured reply from the intent engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub intents: Vec<Intent>,
    #[serde(default)]
    pub output: ReplyOutput,
    pub context: TurnContext,
}

impl AssistantReply {
    /// Name of the top-ranked intent, if the engine recognized any.
    pub fn top_intent(&self) -> Option<&str> {
        self.intents.first().map(|i| i.intent.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthHandshake {
    pub token: String,
    pub user_id: String,
    pub client_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthResult {
    pub authenticated: bool,
}

/// Merged per-client event stream: authentication outcome, conversation
/// replies, and transport-level disconnects all arrive on one receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChannelEvent {
    Authenticated(AuthResult),
    Reply(Box<AssistantReply>),
    Disconnected { reason: String },
}

pub fn new_client_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_assistant_markup() {
        let u = Utterance::placeholder();
        assert_eq!(u.speaker, Speaker::Assistant);
        assert!(u.render_as_markup);
        assert!(u.is_placeholder);
    }

    #[test]
    fn top_intent_empty_and_ranked() {
        let mut reply = AssistantReply {
            intents: vec![],
            output: ReplyOutput::default(),
            context: TurnContext::default(),
        };
        assert_eq!(reply.top_intent(), None);

        reply.intents = vec![
            Intent {
                intent: "the-weather".into(),
                confidence: 0.9,
            },
            Intent {
                intent: "greetings".into(),
                confidence: 0.2,
            },
        ];
        assert_eq!(reply.top_intent(), Some("the-weather"));
    }

    #[test]
    fn context_round_trips_unknown_fields() {
        let raw = serde_json::json!({
            "client_id": "abc",
            "weather_where": "Austin",
            "weather_activity": true,
            "system": {"dialog_turn_counter": 3},
            "inProgress": false
        });
        let ctx: TurnContext = serde_json::from_value(raw).unwrap();
        assert_eq!(ctx.client_id.as_deref(), Some("abc"));
        assert!(ctx.weather_activity);
        assert!(ctx.extra.contains_key("system"));
        assert!(ctx.extra.contains_key("inProgress"));

        let back = serde_json::to_value(&ctx).unwrap();
        assert_eq!(back["system"]["dialog_turn_counter"], 3);
        assert_eq!(back["inProgress"], false);
    }

    #[test]
    fn context_default_has_no_slots() {
        let ctx = TurnContext::default();
        assert!(ctx.client_id.is_none());
        assert!(ctx.weather_what.is_none());
        assert!(!ctx.weather_activity);
    }
}
