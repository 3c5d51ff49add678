//! Plugin trait definitions

use crate::application::errors::{PluginError, PluginResult};
use crate::application::registry::Registrar;

/// Core plugin trait that all plugins must implement
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Attach setup routine, command handlers, event observers and exit hooks
    fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()>;
}

/// A resolved plugin module.
///
/// For shared-library plugins the library is kept here and dropped after the
/// plugin instance (fields drop in declaration order).
pub struct PluginModule {
    plugin: Box<dyn Plugin>,
    library: Option<libloading::Library>,
}

impl PluginModule {
    pub fn new(plugin: Box<dyn Plugin>) -> Self {
        Self { plugin, library: None }
    }

    pub(crate) fn from_library(plugin: Box<dyn Plugin>, library: libloading::Library) -> Self {
        Self {
            plugin,
            library: Some(library),
        }
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

/// Resolves a module path from the `Plugins` section to a plugin
pub trait PluginSource {
    /// Load the module named `module` on behalf of `alias`.
    ///
    /// Must return `PluginError::NotFound` when the source does not know the
    /// module, so a chain of sources can fall through to the next one.
    fn resolve(&self, alias: &str, module: &str) -> PluginResult<PluginModule>;

    /// Module paths this source can list up front
    fn available(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Tries each source in turn until one knows the module
#[derive(Default)]
pub struct SourceChain {
    sources: Vec<Box<dyn PluginSource>>,
}

impl SourceChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source<S: PluginSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl PluginSource for SourceChain {
    fn resolve(&self, alias: &str, module: &str) -> PluginResult<PluginModule> {
        for source in &self.sources {
            match source.resolve(alias, module) {
                Err(PluginError::NotFound { .. }) => continue,
                other => return other,
            }
        }
        Err(PluginError::NotFound {
            alias: alias.to_string(),
            module: module.to_string(),
        })
    }

    fn available(&self) -> Vec<String> {
        self.sources.iter().flat_map(|s| s.available()).collect()
    }
}
