use cumulo_schema::{ChannelEvent, ConversationTurn, TurnContext, Utterance};
use tokio::sync::{mpsc, watch};

use crate::connection::SessionConnection;
use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticated,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatVisibility {
    Hidden,
    Shown,
}

/// Client-facing conversation controller. Holds the transcript and the
/// opaque context, drives the connection, and enforces the turn-sequencing
/// state machine: one placeholder at a time, one outstanding turn at a
/// time.
///
/// Transcript additions (placeholders included) fan out on an unbounded
/// mpsc; visibility changes go through a watch channel so late subscribers
/// see the latest value.
pub struct ChatController {
    connection: SessionConnection,
    state: SessionState,
    visibility: ChatVisibility,
    connected: bool,
    initialized: bool,
    transcript: Vec<Utterance>,
    context: TurnContext,
    events: Option<mpsc::Receiver<ChannelEvent>>,
    transcript_tx: mpsc::UnboundedSender<Utterance>,
    visibility_tx: watch::Sender<ChatVisibility>,
}

impl ChatController {
    pub fn new(
        connection: SessionConnection,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<Utterance>,
        watch::Receiver<ChatVisibility>,
    ) {
        let (transcript_tx, transcript_rx) = mpsc::unbounded_channel();
        let (visibility_tx, visibility_rx) = watch::channel(ChatVisibility::Hidden);
        (
            Self {
                connection,
                state: SessionState::Disconnected,
                visibility: ChatVisibility::Hidden,
                connected: false,
                initialized: false,
                transcript: Vec::new(),
                context: TurnContext::default(),
                events: None,
                transcript_tx,
                visibility_tx,
            },
            transcript_rx,
            visibility_rx,
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &[Utterance] {
        &self.transcript
    }

    pub fn context(&self) -> &TurnContext {
        &self.context
    }

    pub fn client_id(&self) -> Option<&str> {
        self.connection.client_id()
    }

    /// Dispatches one turn. Appends the "typing" placeholder immediately,
    /// connects and authenticates first if no channel is live, then sends
    /// exactly one outbound message. A turn already awaiting its reply
    /// rejects the call before any side effect.
    pub async fn send_conversation(&mut self, text: &str) -> Result<(), SessionError> {
        if self.state == SessionState::AwaitingReply {
            return Err(SessionError::TurnInFlight);
        }

        self.push_utterance(Utterance::placeholder());
        self.state = SessionState::AwaitingReply;

        if !self.connected {
            if let Err(err) = self.establish_channel().await {
                self.drop_placeholder();
                self.state = SessionState::Disconnected;
                return Err(err);
            }
            self.state = SessionState::AwaitingReply;
        }

        let turn = ConversationTurn::new(text, self.context.clone());
        if let Err(err) = self.connection.send_turn(turn).await {
            self.drop_placeholder();
            self.state = if self.connected {
                SessionState::Authenticated
            } else {
                SessionState::Disconnected
            };
            return Err(err);
        }
        Ok(())
    }

    /// Appends a human turn to the transcript and dispatches it.
    pub async fn add_human_utterance(&mut self, text: &str) -> Result<(), SessionError> {
        if self.state == SessionState::AwaitingReply {
            return Err(SessionError::TurnInFlight);
        }
        self.push_utterance(Utterance::human(text));
        self.send_conversation(text).await
    }

    /// Starts the conversation over: clears the transcript and the opaque
    /// context, then issues an empty-text turn to fetch a fresh greeting.
    pub async fn refresh_conversation(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::AwaitingReply {
            return Err(SessionError::TurnInFlight);
        }
        self.transcript.clear();
        self.context = TurnContext::default();
        self.initialized = false;
        self.send_conversation("").await
    }

    pub async fn toggle_chat_state(&mut self) -> Result<(), SessionError> {
        match self.visibility {
            ChatVisibility::Hidden => self.set_state_show().await,
            ChatVisibility::Shown => {
                self.set_state_hide();
                Ok(())
            }
        }
    }

    /// Shows the chat. The first transition to visible fetches a greeting
    /// through an implicit empty-text turn.
    pub async fn set_state_show(&mut self) -> Result<(), SessionError> {
        self.visibility = ChatVisibility::Shown;
        let _ = self.visibility_tx.send(ChatVisibility::Shown);
        if !self.initialized {
            self.send_conversation("").await
        } else {
            Ok(())
        }
    }

    pub fn set_state_hide(&mut self) {
        self.visibility = ChatVisibility::Hidden;
        let _ = self.visibility_tx.send(ChatVisibility::Hidden);
    }

    /// Awaits the next channel event and applies it. Replies arrive here,
    /// including the delayed weather follow-up.
    pub async fn next_event(&mut self) -> Result<(), SessionError> {
        let Some(events) = self.events.as_mut() else {
            return Err(SessionError::NotConnected);
        };
        match events.recv().await {
            Some(event) => {
                self.handle_event(event).await;
                Ok(())
            }
            None => {
                self.connected = false;
                self.state = SessionState::Disconnected;
                self.events = None;
                Err(SessionError::ChannelClosed)
            }
        }
    }

    pub async fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Authenticated(result) => {
                self.connected = result.authenticated;
                if !result.authenticated {
                    self.state = SessionState::Disconnected;
                }
            }
            ChannelEvent::Reply(reply) => {
                self.initialized = true;
                // The engine owns the context between turns; keep whatever
                // it handed back for the next call.
                self.context = reply.context;
                if self
                    .transcript
                    .last()
                    .is_some_and(|u| u.is_placeholder)
                {
                    self.transcript.pop();
                }
                self.push_utterance(Utterance::assistant(reply.output.text.join(" ")));
                self.state = SessionState::Authenticated;
            }
            ChannelEvent::Disconnected { reason } => {
                tracing::debug!(%reason, "channel disconnected");
                self.connected = false;
                self.state = SessionState::Disconnected;
                self.events = None;
                self.connection.disconnect().await;
            }
        }
    }

    async fn establish_channel(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Connecting;
        let mut events = self.connection.connect().await?;

        // The authentication outcome is the first event on the fresh
        // channel.
        loop {
            match events.recv().await {
                Some(ChannelEvent::Authenticated(result)) => {
                    if result.authenticated {
                        self.connected = true;
                        self.state = SessionState::Authenticated;
                        break;
                    }
                    self.connection.disconnect().await;
                    return Err(SessionError::AuthenticationFailed);
                }
                Some(other) => {
                    tracing::debug!(?other, "ignoring event before authentication outcome");
                }
                None => return Err(SessionError::ChannelClosed),
            }
        }

        self.events = Some(events);
        Ok(())
    }

    fn push_utterance(&mut self, utterance: Utterance) {
        let _ = self.transcript_tx.send(utterance.clone());
        self.transcript.push(utterance);
    }

    fn drop_placeholder(&mut self) {
        if self
            .transcript
            .last()
            .is_some_and(|u| u.is_placeholder)
        {
            self.transcript.pop();
        }
    }
}
