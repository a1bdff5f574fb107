pub mod connection;
pub mod controller;
pub mod error;

pub use connection::{ClientCredentials, SessionConnection};
pub use controller::{ChatController, ChatVisibility, SessionState};
pub use error::SessionError;
