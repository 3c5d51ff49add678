//! Shared-library plugin used by the library loading tests.
//!
//! Every closure it registers captures heap data, so dropping them after the
//! library is unloaded would crash the host.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use modbot::application::bot::BotHandle;
use modbot::application::errors::{CommandError, PluginError, PluginResult};
use modbot::application::registry::Registrar;
use modbot::domain::entities::{CommandHandler, EventType};
use modbot::plugins::Plugin;

#[derive(Default)]
struct Fixture {
    bot: Arc<OnceCell<BotHandle>>,
}

impl Plugin for Fixture {
    fn name(&self) -> &str {
        "library-fixture"
    }

    fn version(&self) -> &str {
        "1.0"
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
        let alias = registrar.alias().to_string();

        let bot = Arc::clone(&self.bot);
        registrar.setup(move |handle, options| {
            if options.get::<bool>("fail")?.unwrap_or(false) {
                return Err(PluginError::Runtime {
                    plugin: "library-fixture".to_string(),
                    reason: "asked to fail".to_string(),
                });
            }
            let _ = bot.set(handle.clone());
            Ok(())
        });

        let bot = Arc::clone(&self.bot);
        let greeting = format!("hello from {}", alias);
        registrar.command(
            &["fixture"],
            CommandHandler::new(move |inv| {
                let bot = bot
                    .get()
                    .ok_or_else(|| CommandError::ExecutionFailed("not set up".to_string()))?;
                bot.send_text(&inv.sender.id, &greeting)
                    .map_err(|e| CommandError::ExecutionFailed(e.to_string()))
            })
            .with_description("Reply from a library plugin"),
        )?;

        let seen = format!("{} saw a client", alias);
        registrar.on(&[EventType::ClientEntered], move |_| {
            let _ = seen.len();
            Ok(())
        });

        let farewell = format!("{} exiting", alias);
        registrar.on_exit(move || {
            let _ = farewell.len();
            Ok(())
        });
        Ok(())
    }
}

modbot::declare_plugin!(Fixture::default());
