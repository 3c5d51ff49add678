use crate::application::errors::BotError;
use crate::domain::entities::Client;

/// Connection trait - abstraction over the chat server protocol client
pub trait Connection: Send + Sync {
    /// Send a private text message to a client
    fn send_text(&self, client_id: &str, text: &str) -> Result<(), BotError>;

    /// List the clients currently connected
    fn clients(&self) -> Result<Vec<Client>, BotError>;

    /// Close the connection to the server
    fn quit(&self) -> Result<(), BotError>;

    /// Get bot info
    fn info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
}
