//! Plugin host - owns the registry and everything loaded into it

use crate::application::bot::BotHandle;
use crate::application::errors::{BotError, CommandError};
use crate::application::registry::Registry;
use crate::domain::entities::{Event, EventType, Message};
use crate::infrastructure::config::Config;
use crate::plugins::PluginSource;

use super::command_service::CommandService;
use super::module_loader::{LoadedPlugins, ModuleLoader};
use super::shutdown_service::ShutdownReport;

/// A bot with its plugins loaded and set up
pub struct PluginHost {
    registry: Registry,
    plugins: LoadedPlugins,
    bot: BotHandle,
    commands: CommandService,
}

impl PluginHost {
    /// Build a fresh registry and load every configured plugin into it.
    ///
    /// Fails without partial activation if any plugin cannot be loaded or set up.
    pub fn start(source: &dyn PluginSource, bot: BotHandle, config: &mut Config) -> Result<Self, BotError> {
        let settings = config.bot_settings()?;
        let mut registry = Registry::new();

        let plugins = ModuleLoader::new(source).load(&mut registry, &bot, config)?;

        tracing::info!(
            "{} plugin(s) ready: {} command(s), {} observer(s), {} exit hook(s)",
            plugins.len(),
            registry.commands().len(),
            registry.events().len(),
            registry.shutdown().len()
        );

        Ok(Self {
            registry,
            plugins,
            bot,
            commands: CommandService::new(settings.prefix),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn plugins(&self) -> &LoadedPlugins {
        &self.plugins
    }

    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }

    pub fn command_service(&self) -> &CommandService {
        &self.commands
    }

    /// Notify observers of a server event
    pub fn dispatch_event(&self, event: &Event) -> usize {
        self.registry.events().dispatch(event)
    }

    /// Handle an incoming text message.
    ///
    /// Observers of `TextMessage` always see it; command messages are then
    /// routed to their handler. Returns whether a command ran.
    pub fn receive(&self, message: &Message) -> Result<bool, CommandError> {
        let mut event = Event::new(EventType::TextMessage)
            .with("msg", message.raw.clone())
            .with("target", message.target.clone());
        if let Some(sender) = &message.sender {
            event = event.with("invokerid", sender.id.clone());
            if let Some(nickname) = &sender.nickname {
                event = event.with("invokername", nickname.clone());
            }
        }
        self.dispatch_event(&event);

        self.commands.handle(self.registry.commands(), message)
    }

    /// Run every plugin's exit hook
    pub fn shutdown(&self) -> ShutdownReport {
        tracing::info!("Exiting {} plugin(s)", self.plugins.len());
        self.registry.shutdown().shutdown_all()
    }
}
