//! Module loader - loads configured plugins and runs their setup routines
//!
//! Loading happens in two passes. First every `alias: module` pair from the
//! `Plugins` section is resolved and registered, in configuration order; any
//! failure aborts the whole load. Only then are the queued setup routines
//! run, in the order they were queued, each with the configuration section
//! of its plugin (or the plugin's defaults when there is none).

use std::collections::HashMap;

use crate::application::bot::BotHandle;
use crate::application::errors::{PluginError, PluginResult};
use crate::application::registry::Registry;
use crate::infrastructure::config::{Config, PluginOptions, PluginSpec};
use crate::plugins::PluginSource;

/// A plugin that made it through the load phase.
///
/// The module itself is owned by the `Registry` it registered into.
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    pub alias: String,
    pub module: String,
    pub name: String,
    pub version: String,
    pub dynamic: bool,
}

/// Loaded plugins in load order, one per alias
#[derive(Default)]
pub struct LoadedPlugins {
    plugins: Vec<LoadedPlugin>,
}

impl LoadedPlugins {
    pub fn get(&self, alias: &str) -> Option<&LoadedPlugin> {
        self.plugins.iter().find(|p| p.alias == alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.alias.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedPlugin> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Configuration section name for a plugin alias.
///
/// A plugin laid out as a sub-path (`weather.main`) is configured under its
/// first segment (`weather`). Deeper paths are used unchanged.
pub fn config_section_name(alias: &str) -> &str {
    match alias.split_once('.') {
        Some((head, tail)) if !tail.contains('.') => head,
        _ => alias,
    }
}

pub struct ModuleLoader<'a> {
    source: &'a dyn PluginSource,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(source: &'a dyn PluginSource) -> Self {
        Self { source }
    }

    /// Load every plugin named in `config`, then run all queued setups.
    ///
    /// Consumes the `Plugins` section and each plugin section it uses. Every
    /// resolved module is handed to `registry`, on failure too, so library
    /// code stays mapped until the registry is dropped.
    pub fn load(&self, registry: &mut Registry, bot: &BotHandle, config: &mut Config) -> PluginResult<LoadedPlugins> {
        let specs = config.take_plugin_specs().map_err(|e| {
            tracing::error!("Error while reading plugin list: {}", e);
            e
        })?;
        if specs.is_empty() {
            tracing::info!("No plugins configured");
        }

        let loaded = self.load_modules(registry, specs)?;
        self.run_setups(registry, bot, config, &loaded)?;
        Ok(loaded)
    }

    fn load_modules(&self, registry: &mut Registry, specs: Vec<PluginSpec>) -> PluginResult<LoadedPlugins> {
        let mut loaded = LoadedPlugins::default();
        let mut owners: HashMap<String, String> = HashMap::new();

        for spec in specs {
            if let Some(owner) = owners.get(&spec.module) {
                let e = PluginError::MalformedSpec(format!(
                    "module '{}' is configured under both '{}' and '{}'",
                    spec.module, owner, spec.alias
                ));
                tracing::error!("Error while loading plugin {}: {}", spec.alias, e);
                return Err(e);
            }

            let handle = self.source.resolve(&spec.alias, &spec.module).map_err(|e| {
                tracing::error!("Error while loading plugin {} from {}: {}", spec.alias, spec.module, e);
                e
            })?;

            let registered = handle.plugin().register(&mut registry.registrar(spec.alias.as_str()));
            let plugin = LoadedPlugin {
                name: handle.plugin().name().to_string(),
                version: handle.plugin().version().to_string(),
                dynamic: handle.is_dynamic(),
                alias: spec.alias,
                module: spec.module,
            };
            registry.retain_module(handle);

            if let Err(e) = registered {
                tracing::error!("Error while registering plugin {} from {}: {}", plugin.alias, plugin.module, e);
                return Err(e);
            }

            tracing::info!("Loaded module {}", plugin.module);
            owners.insert(plugin.module.clone(), plugin.alias.clone());
            loaded.plugins.push(plugin);
        }

        Ok(loaded)
    }

    fn run_setups(
        &self,
        registry: &mut Registry,
        bot: &BotHandle,
        config: &mut Config,
        loaded: &LoadedPlugins,
    ) -> PluginResult<()> {
        for pending in registry.take_pending_setups() {
            if !loaded.contains(&pending.alias) {
                let e = PluginError::SetupResolution(format!("no loaded plugin has alias '{}'", pending.alias));
                tracing::error!("Error while setting up the module {}: {}", pending.alias, e);
                return Err(e);
            }

            let section_name = config_section_name(&pending.alias);
            let options = match config.take_section(section_name) {
                Some(section) => {
                    let options = PluginOptions::from_section(section_name, section).map_err(|e| {
                        tracing::error!("Error while setting up the module {}: {}", pending.alias, e);
                        e
                    })?;
                    tracing::info!("{} plugin config: {:?}", section_name, options);
                    options
                }
                None => {
                    tracing::info!("{} plugin config: Unconfigured, using plugin defaults.", section_name);
                    PluginOptions::defaults()
                }
            };

            (pending.routine)(bot, options).map_err(|e| {
                tracing::error!("Error while setting up the module {}: {}", pending.alias, e);
                match e {
                    PluginError::Setup { .. } => e,
                    other => PluginError::Setup {
                        plugin: pending.alias.clone(),
                        reason: other.to_string(),
                    },
                }
            })?;
        }
        Ok(())
    }
}
