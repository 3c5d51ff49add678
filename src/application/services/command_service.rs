use crate::application::errors::CommandError;
use crate::domain::entities::{Client, CommandRegistry, Content, Invocation, Message};

/// Dispatches command messages to registered handlers, enforcing allowed groups
pub struct CommandService {
    prefix: String,
}

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Run the handler for a command message.
    ///
    /// Returns `Ok(false)` for messages that are not commands.
    pub fn handle(&self, commands: &CommandRegistry, message: &Message) -> Result<bool, CommandError> {
        let Content::Command { name, .. } = &message.content else {
            return Ok(false);
        };

        let handler = commands
            .handler_for(name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        let anonymous;
        let sender = match &message.sender {
            Some(sender) => sender,
            None => {
                anonymous = Client::new("unknown");
                &anonymous
            }
        };

        if !handler.permits(sender) {
            tracing::warn!(
                "{} tried to use {}{} without being in {:?}",
                sender,
                self.prefix,
                name,
                handler.allowed_groups
            );
            return Err(CommandError::PermissionDenied {
                command: name.clone(),
                sender: sender.to_string(),
            });
        }

        tracing::debug!("{} invoked {}{}", sender, self.prefix, name);
        handler.call(&Invocation {
            sender,
            message,
            commands,
            prefix: &self.prefix,
        })?;
        Ok(true)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
