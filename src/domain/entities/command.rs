use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{Client, Message};
use crate::application::errors::CommandError;

/// Everything a command handler gets to see about one invocation
pub struct Invocation<'a> {
    pub sender: &'a Client,
    pub message: &'a Message,
    pub commands: &'a CommandRegistry,
    /// Command prefix of the dispatching service
    pub prefix: &'a str,
}

impl Invocation<'_> {
    /// Arguments following the command name
    pub fn args(&self) -> &[String] {
        match &self.message.content {
            super::Content::Command { args, .. } => args,
            _ => &[],
        }
    }

    /// Help for the command named in the first argument, or the list of
    /// every registered command when there is none
    pub fn help_text(&self) -> String {
        let Some(name) = self.args().first() else {
            return self
                .commands
                .names()
                .iter()
                .map(|name| format!("{}{}", self.prefix, name))
                .collect::<Vec<_>>()
                .join(", ");
        };

        match self.commands.handler_for(name) {
            Some(handler) => {
                let mut help = format!(
                    "{}{} - {}",
                    self.prefix,
                    name,
                    handler.description.as_deref().unwrap_or("No description")
                );
                if !handler.allowed_groups.is_empty() {
                    help.push_str(&format!("\nAllowed groups: {}", handler.allowed_groups.join(", ")));
                }
                help
            }
            None => format!("Command {}{} not found", self.prefix, name),
        }
    }
}

/// Command handler function type
pub type CommandFn = Arc<dyn Fn(&Invocation<'_>) -> Result<(), CommandError> + Send + Sync>;

/// A command handler paired with its metadata.
///
/// The allowed groups are descriptive only: the registry stores them, whoever
/// dispatches commands decides whether to enforce them.
#[derive(Clone)]
pub struct CommandHandler {
    callback: CommandFn,
    pub allowed_groups: Vec<String>,
    pub description: Option<String>,
    pub plugin: Option<String>,
}

impl CommandHandler {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(handler),
            allowed_groups: Vec::new(),
            description: None,
            plugin: None,
        }
    }

    /// Attach the ordered list of server groups allowed to use this handler
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// True if `client` passes the allowed-group list (an empty list allows everyone)
    pub fn permits(&self, client: &Client) -> bool {
        self.allowed_groups.is_empty() || client.in_any_group(&self.allowed_groups)
    }

    pub fn call(&self, invocation: &Invocation<'_>) -> Result<(), CommandError> {
        (self.callback)(invocation)
    }

    /// True if both records wrap the same handler function
    pub fn same_callback(&self, other: &CommandHandler) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandler")
            .field("allowed_groups", &self.allowed_groups)
            .field("description", &self.description)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

/// Command registry: one handler per command name, last registration wins
#[derive(Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `handler`, returning the handler it replaced (if any)
    pub fn add_handler(&mut self, name: impl Into<String>, handler: CommandHandler) -> Option<CommandHandler> {
        let name = name.into();
        let previous = self.handlers.insert(name.clone(), handler);
        if let Some(prev) = &previous {
            tracing::warn!(
                "Command '{}' registered again, overriding handler from plugin {}",
                name,
                prev.plugin.as_deref().unwrap_or("<unknown>")
            );
        }
        previous
    }

    pub fn handler_for(&self, name: &str) -> Option<&CommandHandler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// All command names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
