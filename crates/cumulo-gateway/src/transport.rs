use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cumulo_bus::{ChannelTransport, ClientBus};
use cumulo_schema::{AuthHandshake, AuthResult, ChannelEvent, ConversationTurn};
use tokio::sync::mpsc;

use crate::Gateway;

/// Validates a session's credential token. Real token storage belongs to
/// the hosting process; the gateway only needs a yes/no.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str, user_id: &str) -> bool;
}

/// Accepts any handshake presenting the one expected token.
pub struct StaticTokenValidator {
    token: String,
}

impl StaticTokenValidator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str, _user_id: &str) -> bool {
        !self.token.is_empty() && token == self.token
    }
}

/// In-process channel transport: client sessions register on the bus and
/// hand their turns straight to the gateway.
pub struct GatewayChannel {
    bus: Arc<ClientBus>,
    gateway: Arc<Gateway>,
    validator: Arc<dyn TokenValidator>,
}

impl GatewayChannel {
    pub fn new(
        bus: Arc<ClientBus>,
        gateway: Arc<Gateway>,
        validator: Arc<dyn TokenValidator>,
    ) -> Self {
        Self {
            bus,
            gateway,
            validator,
        }
    }
}

#[async_trait]
impl ChannelTransport for GatewayChannel {
    async fn open(&self, client_id: &str) -> Result<mpsc::Receiver<ChannelEvent>> {
        Ok(self.bus.register(client_id).await)
    }

    async fn authenticate(&self, handshake: AuthHandshake) -> Result<()> {
        let authenticated = self
            .validator
            .validate(&handshake.token, &handshake.user_id)
            .await;
        if !authenticated {
            tracing::warn!(
                client_id = %handshake.client_id,
                user_id = %handshake.user_id,
                "channel authentication rejected"
            );
        }
        self.bus
            .publish_to(
                &handshake.client_id,
                ChannelEvent::Authenticated(AuthResult { authenticated }),
            )
            .await;
        Ok(())
    }

    async fn send(&self, turn: ConversationTurn) -> Result<()> {
        self.gateway.accept(turn);
        Ok(())
    }

    async fn close(&self, client_id: &str) {
        self.bus.unregister(client_id).await;
    }
}
