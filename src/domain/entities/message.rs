use super::Client;
use chrono::{DateTime, Utc};

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

impl Content {
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Content::Command { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A text message received from (or sent to) the chat server
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    /// Client, channel or server the message was addressed to
    pub target: String,
    pub sender: Option<Client>,
    pub content: Content,
    /// Unparsed text as sent by the client
    pub raw: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(target: impl Into<String>, content: Content) -> Self {
        let raw = match &content {
            Content::Text(s) => s.clone(),
            Content::Command { name, args } if args.is_empty() => name.clone(),
            Content::Command { name, args } => format!("{} {}", name, args.join(" ")),
            Content::Empty => String::new(),
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target: target.into(),
            sender: None,
            content,
            raw,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(target, Content::Text(text.into()))
    }

    pub fn from_command(target: impl Into<String>, name: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(target, Content::Command { name: name.into(), args })
    }

    pub fn with_sender(mut self, client: Client) -> Self {
        self.sender = Some(client);
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Id of the sending client, if known
    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().map(|c| c.id.as_str())
    }
}
