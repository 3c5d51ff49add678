//! Static plugin catalog - module paths compiled into the host

use std::collections::BTreeMap;

use super::greeter::Greeter;
use super::trait_def::{Plugin, PluginModule, PluginSource};
use super::utils::Utils;
use crate::application::errors::{PluginError, PluginResult};

type Factory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Maps module paths to plugin constructors
#[derive(Default)]
pub struct StaticCatalog {
    factories: BTreeMap<String, Factory>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the plugins shipped with the bot
    pub fn builtin() -> Self {
        Self::new()
            .with("utils", || Box::new(Utils::new()))
            .with("greeter", || Box::new(Greeter::new()))
    }

    pub fn with<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.insert(module, factory);
        self
    }

    pub fn insert<F>(&mut self, module: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories.insert(module.into(), Box::new(factory));
    }

    pub fn contains(&self, module: &str) -> bool {
        self.factories.contains_key(module)
    }
}

impl PluginSource for StaticCatalog {
    fn resolve(&self, alias: &str, module: &str) -> PluginResult<PluginModule> {
        let factory = self.factories.get(module).ok_or_else(|| PluginError::NotFound {
            alias: alias.to_string(),
            module: module.to_string(),
        })?;
        Ok(PluginModule::new(factory()))
    }

    fn available(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}
