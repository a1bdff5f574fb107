/// Client-side session failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no channel is connected")]
    NotConnected,
    #[error("channel authentication was rejected")]
    AuthenticationFailed,
    #[error("a turn is already awaiting its reply")]
    TurnInFlight,
    #[error("the event channel closed")]
    ChannelClosed,
    #[error("transport failure: {0}")]
    Transport(#[source] anyhow::Error),
}
