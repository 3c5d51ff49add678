//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Client, Content, Message};

/// Parses incoming text into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse a text message
    pub fn parse(&self, target: impl Into<String>, text: impl Into<String>, sender: Option<Client>) -> Message {
        let text = text.into();
        let target = target.into();

        let trimmed = text.trim();
        let message = if trimmed.is_empty() {
            Message::new(target, Content::Empty)
        } else if let Some(cmd_text) = self.strip_prefix(trimmed) {
            self.parse_command(target, cmd_text)
        } else {
            Message::new(target, Content::Text(trimmed.to_string()))
        };

        let message = message.with_raw(text);
        match sender {
            Some(client) => message.with_sender(client),
            None => message,
        }
    }

    /// Remove the command prefix (either / or the configured one)
    fn strip_prefix<'t>(&self, text: &'t str) -> Option<&'t str> {
        if !self.command_prefix.is_empty() {
            if let Some(rest) = text.strip_prefix(self.command_prefix.as_str()) {
                return Some(rest);
            }
        }
        text.strip_prefix('/')
    }

    /// Parse a command message
    fn parse_command(&self, target: String, cmd_text: &str) -> Message {
        let mut parts = cmd_text.split_whitespace();
        let Some(name) = parts.next() else {
            return Message::new(target, Content::Text(cmd_text.to_string()));
        };
        let args = parts.map(str::to_string).collect();

        Message::from_command(target, name, args)
    }
}
