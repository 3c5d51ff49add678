//! Console adapter for development/testing
//!
//! Stands in for the chat server connection: text sent to clients is printed
//! to stdout and the only connected client is the operator at the terminal.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::application::errors::BotError;
use crate::domain::entities::Client;
use crate::domain::traits::{BotInfo, Connection};
use crate::infrastructure::config::BotSettings;

/// Console connection for local development
pub struct ConsoleConnection {
    info: BotInfo,
    operator: Client,
    closed: AtomicBool,
}

impl ConsoleConnection {
    pub fn new(settings: &BotSettings) -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: settings.name.clone(),
            },
            operator: Client::new("1")
                .with_nickname(settings.console.nickname.clone())
                .with_groups(settings.console.groups.clone())
                .with_channel("1"),
            closed: AtomicBool::new(false),
        }
    }

    /// The client typing at the terminal
    pub fn operator(&self) -> &Client {
        &self.operator
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for ConsoleConnection {
    fn send_text(&self, client_id: &str, text: &str) -> Result<(), BotError> {
        if self.is_closed() {
            return Err(BotError::Connection("console connection closed".to_string()));
        }
        if client_id == self.operator.id {
            println!("[BOT] {}", text);
        } else {
            println!("[BOT -> clid={}] {}", client_id, text);
        }
        Ok(())
    }

    fn clients(&self) -> Result<Vec<Client>, BotError> {
        Ok(vec![self.operator.clone()])
    }

    fn quit(&self) -> Result<(), BotError> {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("Console connection closed");
        Ok(())
    }

    fn info(&self) -> BotInfo {
        self.info.clone()
    }
}
