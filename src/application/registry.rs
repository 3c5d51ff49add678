//! Registry - the single place plugins attach themselves to
//!
//! A `Registry` is created once by the host and handed to each plugin
//! through a `Registrar` bound to that plugin's alias. Everything a plugin
//! registers is tagged with the alias, so the loader never has to guess which
//! plugin a setup routine belongs to.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::fmt;
use std::sync::Arc;

use crate::application::bot::BotHandle;
use crate::application::errors::{PluginError, PluginResult};
use crate::application::services::ShutdownCoordinator;
use crate::domain::entities::{CommandHandler, CommandRegistry, Event, EventRegistry, EventType};
use crate::infrastructure::config::PluginOptions;
use crate::plugins::PluginModule;

static COMMAND_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.-]+$").expect("command name pattern"));

/// Setup routine signature
pub type SetupFn = Box<dyn FnOnce(&BotHandle, PluginOptions) -> PluginResult<()> + Send>;

/// A setup routine waiting for the load phase to finish
pub struct PendingSetup {
    pub alias: String,
    pub routine: SetupFn,
}

impl fmt::Debug for PendingSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSetup").field("alias", &self.alias).finish_non_exhaustive()
    }
}

/// Event observers, command handlers, shutdown hooks and pending setups,
/// plus the plugin modules their code lives in.
#[derive(Default)]
pub struct Registry {
    events: EventRegistry,
    commands: CommandRegistry,
    shutdown: ShutdownCoordinator,
    pending_setups: Vec<PendingSetup>,
    // Must stay the last field: closures above may point into a plugin
    // library, so the libraries are unloaded only after they are dropped.
    modules: Vec<PluginModule>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar for the plugin configured under `alias`
    pub fn registrar(&mut self, alias: impl Into<String>) -> Registrar<'_> {
        Registrar {
            alias: alias.into(),
            registry: self,
        }
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    pub fn pending_setups(&self) -> &[PendingSetup] {
        &self.pending_setups
    }

    /// Hand over all queued setup routines in the order they were queued
    pub fn take_pending_setups(&mut self) -> Vec<PendingSetup> {
        std::mem::take(&mut self.pending_setups)
    }

    /// Keep a resolved module alive for as long as the registry.
    ///
    /// Called for every module that got to `register`, whether or not
    /// registration succeeded.
    pub fn retain_module(&mut self, module: PluginModule) {
        self.modules.push(module);
    }

    pub fn modules(&self) -> &[PluginModule] {
        &self.modules
    }
}

/// Registration surface for one plugin
pub struct Registrar<'a> {
    alias: String,
    registry: &'a mut Registry,
}

impl Registrar<'_> {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Queue a setup routine, run once after every plugin has been loaded
    pub fn setup<F>(&mut self, routine: F) -> &mut Self
    where
        F: FnOnce(&BotHandle, PluginOptions) -> PluginResult<()> + Send + 'static,
    {
        self.registry.pending_setups.push(PendingSetup {
            alias: self.alias.clone(),
            routine: Box::new(routine),
        });
        self
    }

    /// Observe every event whose type is in `types`
    pub fn on<F>(&mut self, types: &[EventType], observer: F) -> &mut Self
    where
        F: Fn(&Event) -> PluginResult<()> + Send + Sync + 'static,
    {
        let observer: Arc<dyn Fn(&Event) -> PluginResult<()> + Send + Sync> = Arc::new(observer);
        for event_type in types {
            tracing::debug!("{} observes {}", self.alias, event_type);
            self.registry.events.add_observer(event_type.clone(), Arc::clone(&observer));
        }
        self
    }

    /// Handle each command in `names` with `handler`.
    ///
    /// An existing handler for a name is replaced.
    pub fn command(&mut self, names: &[&str], handler: CommandHandler) -> PluginResult<&mut Self> {
        if let Some(bad) = names.iter().find(|name| !COMMAND_NAME.is_match(name)) {
            return Err(PluginError::Registration(format!(
                "plugin '{}' tried to register invalid command name '{}'",
                self.alias, bad
            )));
        }

        let mut handler = handler;
        handler.plugin = Some(self.alias.clone());
        for name in names {
            tracing::debug!("{} handles command '{}'", self.alias, name);
            self.registry.commands.add_handler(*name, handler.clone());
        }
        Ok(self)
    }

    /// Run `hook` whenever the bot shuts down
    pub fn on_exit<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn() -> PluginResult<()> + Send + Sync + 'static,
    {
        self.registry.shutdown.add_hook(self.alias.clone(), hook);
        self
    }
}
