//! Utility commands: version, help, stop and restart

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Plugin;
use crate::application::bot::{BotHandle, ControlRequest};
use crate::application::errors::{CommandError, PluginResult};
use crate::application::registry::Registrar;
use crate::domain::entities::{CommandHandler, Invocation};

pub const VERSION: &str = "0.5";

const ADMINS: [&str; 1] = ["Server Admin"];
const STAFF: [&str; 2] = ["Server Admin", "Moderator"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UtilsSettings {
    /// Log instead of performing actual actions
    enable_dry_run: bool,
}

#[derive(Default)]
struct State {
    bot: OnceCell<BotHandle>,
    dry_run: AtomicBool,
}

impl State {
    fn bot(&self) -> Result<&BotHandle, CommandError> {
        self.bot
            .get()
            .ok_or_else(|| CommandError::ExecutionFailed("utils plugin is not set up".to_string()))
    }

    fn reply(&self, inv: &Invocation<'_>, text: &str) -> Result<(), CommandError> {
        self.bot()?
            .send_text(&inv.sender.id, text)
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))
    }

    fn dry_run(&self) -> bool {
        self.dry_run.load(Ordering::Relaxed)
    }

    fn control(&self, inv: &Invocation<'_>, request: ControlRequest) -> Result<(), CommandError> {
        let verb = match request {
            ControlRequest::Stop => "stopped",
            ControlRequest::Restart => "restarted",
        };
        if self.dry_run() {
            tracing::info!(
                "Bot would have been {} by clid={}, when dry-run would be disabled!",
                verb,
                inv.sender.id
            );
            return Ok(());
        }
        self.bot()?.request(request);
        tracing::info!("Bot has been {} by clid={}!", verb, inv.sender.id);
        Ok(())
    }
}

/// Built-in utility plugin
#[derive(Default)]
pub struct Utils {
    state: Arc<State>,
}

impl Utils {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for Utils {
    fn name(&self) -> &str {
        "utils"
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn description(&self) -> &str {
        "Version, help, stop and restart commands"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
        let state = Arc::clone(&self.state);
        registrar.setup(move |bot, options| {
            let settings: UtilsSettings = options.parse()?;
            if state.bot.set(bot.clone()).is_err() {
                tracing::warn!("utils plugin set up twice, keeping the first bot handle");
            }
            state.dry_run.store(settings.enable_dry_run, Ordering::Relaxed);
            if settings.enable_dry_run {
                tracing::info!("Dry run is enabled - logging actions instead of actually performing them.");
            }
            Ok(())
        });

        let state = Arc::clone(&self.state);
        registrar.command(
            &["version"],
            CommandHandler::new(move |inv| {
                state.reply(inv, &format!("The version of the `utils` plugin is `{}`.", VERSION))
            })
            .with_groups(STAFF)
            .with_description("Show the version of the utils plugin"),
        )?;

        let state = Arc::clone(&self.state);
        registrar.command(
            &["stop"],
            CommandHandler::new(move |inv| state.control(inv, ControlRequest::Stop))
                .with_groups(ADMINS)
                .with_description("Stop the bot"),
        )?;

        let state = Arc::clone(&self.state);
        registrar.command(
            &["restart", "reload"],
            CommandHandler::new(move |inv| state.control(inv, ControlRequest::Restart))
                .with_groups(STAFF)
                .with_description("Restart the bot and reload its configuration"),
        )?;

        let state = Arc::clone(&self.state);
        registrar.command(
            &["help", "commands", "commandlist"],
            CommandHandler::new(move |inv| {
                if inv.args().is_empty() {
                    state.reply(inv, "The following bot commands are available:")?;
                }
                state.reply(inv, &inv.help_text())
            })
            .with_groups(STAFF)
            .with_description("List the available bot commands, or describe one"),
        )?;

        registrar.on_exit(|| {
            tracing::info!("utils plugin exiting");
            Ok(())
        });
        Ok(())
    }
}
