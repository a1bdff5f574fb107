use std::sync::Arc;

use cumulo_bus::ChannelTransport;
use cumulo_schema::{new_client_id, AuthHandshake, ChannelEvent, ConversationTurn};
use tokio::sync::mpsc;

use crate::error::SessionError;

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub token: String,
    pub user_id: String,
}

/// Owns one logical channel's transport lifecycle: connect, authenticate,
/// send, disconnect. At most one physical channel exists at a time; a
/// reconnect tears the previous one down first.
pub struct SessionConnection {
    transport: Arc<dyn ChannelTransport>,
    credentials: ClientCredentials,
    client_id: Option<String>,
}

impl SessionConnection {
    pub fn new(transport: Arc<dyn ChannelTransport>, credentials: ClientCredentials) -> Self {
        Self {
            transport,
            credentials,
            client_id: None,
        }
    }

    /// The channel identity stamped onto outbound turns, present while a
    /// channel is open.
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Opens a fresh channel under a new client identity and immediately
    /// presents the credential handshake. Returns the merged event stream;
    /// the authentication outcome is its first event.
    pub async fn connect(
        &mut self,
    ) -> Result<mpsc::Receiver<ChannelEvent>, SessionError> {
        if let Some(previous) = self.client_id.take() {
            tracing::debug!(client_id = %previous, "tearing down previous channel before reconnect");
            self.transport.close(&previous).await;
        }

        let client_id = new_client_id();
        let events = self
            .transport
            .open(&client_id)
            .await
            .map_err(SessionError::Transport)?;
        self.transport
            .authenticate(AuthHandshake {
                token: self.credentials.token.clone(),
                user_id: self.credentials.user_id.clone(),
                client_id: client_id.clone(),
            })
            .await
            .map_err(SessionError::Transport)?;

        self.client_id = Some(client_id);
        Ok(events)
    }

    pub async fn disconnect(&mut self) {
        if let Some(client_id) = self.client_id.take() {
            self.transport.close(&client_id).await;
        }
    }

    /// Stamps the turn's context with this channel's identity and transmits
    /// it. The stamp is how the server addresses the unicast reply back.
    pub async fn send_turn(&self, mut turn: ConversationTurn) -> Result<(), SessionError> {
        let Some(client_id) = &self.client_id else {
            return Err(SessionError::NotConnected);
        };
        turn.context.client_id = Some(client_id.clone());
        self.transport
            .send(turn)
            .await
            .map_err(SessionError::Transport)
    }
}
