//! Greets clients when they connect

use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::Plugin;
use crate::application::bot::BotHandle;
use crate::application::errors::{PluginError, PluginResult};
use crate::application::registry::Registrar;
use crate::domain::entities::{Event, EventType};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GreeterSettings {
    /// `{nickname}` is replaced with the client's nickname
    welcome: String,
}

impl Default for GreeterSettings {
    fn default() -> Self {
        Self {
            welcome: "Welcome, {nickname}!".to_string(),
        }
    }
}

#[derive(Default)]
struct State {
    bot: OnceCell<BotHandle>,
    welcome: OnceCell<String>,
    greeted: AtomicUsize,
}

impl State {
    fn greet(&self, event: &Event) -> PluginResult<()> {
        let (Some(bot), Some(welcome)) = (self.bot.get(), self.welcome.get()) else {
            return Ok(());
        };
        let Some(client_id) = event.get("clid") else {
            tracing::debug!("client-entered event without clid: {:?}", event.data);
            return Ok(());
        };
        let nickname = event.get("client_nickname").unwrap_or(client_id);

        bot.send_text(client_id, &welcome.replace("{nickname}", nickname))
            .map_err(|e| PluginError::Runtime {
                plugin: "greeter".to_string(),
                reason: e.to_string(),
            })?;
        self.greeted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Built-in plugin sending a welcome text to every client that enters
#[derive(Default)]
pub struct Greeter {
    state: Arc<State>,
}

impl Greeter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn version(&self) -> &str {
        "0.1"
    }

    fn description(&self) -> &str {
        "Welcomes clients entering the server"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
        let state = Arc::clone(&self.state);
        let observer = Arc::clone(&self.state);
        let on_exit = Arc::clone(&self.state);

        registrar
            .setup(move |bot, options| {
                let settings: GreeterSettings = options.parse()?;
                let _ = state.bot.set(bot.clone());
                let _ = state.welcome.set(settings.welcome);
                Ok(())
            })
            .on(&[EventType::ClientEntered], move |event| observer.greet(event))
            .on_exit(move || {
                tracing::info!("greeter exiting after {} greeting(s)", on_exit.greeted.load(Ordering::Relaxed));
                Ok(())
            });
        Ok(())
    }
}
