//! Plugin loader - Dynamically loads plugins from shared libraries

use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};

use crate::application::errors::{PluginError, PluginResult};
use crate::plugins::{Plugin, PluginModule, PluginSource};

/// Name of the entry point every plugin library exports
pub const ENTRY_SYMBOL: &[u8] = b"bot_plugin_create";

/// Function signature for plugin creation
#[allow(improper_ctypes_definitions)]
pub type PluginCreateFn = unsafe extern "C" fn() -> *mut dyn Plugin;

/// Loads plugins from `<plugin_dir>/<segments...>/<platform library name>`
pub struct LibraryLoader {
    plugin_dir: PathBuf,
}

impl LibraryLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
        }
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Library file for a dotted module path.
    ///
    /// `weather.main` becomes `<plugin_dir>/weather/libmain.so` on Linux.
    pub fn library_path(&self, module: &str) -> PathBuf {
        let mut segments: Vec<&str> = module.split('.').collect();
        let file = segments.pop().unwrap_or(module);
        let mut path = self.plugin_dir.clone();
        for segment in segments {
            path.push(segment);
        }
        path.push(libloading::library_filename(file));
        path
    }

    fn load_library(&self, alias: &str, module: &str, path: &Path) -> PluginResult<PluginModule> {
        let load_error = |reason: String| PluginError::Load {
            alias: alias.to_string(),
            module: module.to_string(),
            reason,
        };

        // Safety: loading runs the library's initialisers; plugin libraries are
        // trusted code from the operator's plugin directory.
        let library = unsafe { Library::new(path) }.map_err(|e| load_error(format!("failed to load library: {}", e)))?;

        let plugin = unsafe {
            let create: Symbol<PluginCreateFn> = library
                .get(ENTRY_SYMBOL)
                .map_err(|e| load_error(format!("failed to find entry point: {}", e)))?;
            let raw = create();
            if raw.is_null() {
                return Err(load_error("entry point returned null".to_string()));
            }
            Box::from_raw(raw)
        };

        tracing::info!(
            "Loaded plugin library {} ({} v{})",
            path.display(),
            plugin.name(),
            plugin.version()
        );
        Ok(PluginModule::from_library(plugin, library))
    }
}

impl PluginSource for LibraryLoader {
    fn resolve(&self, alias: &str, module: &str) -> PluginResult<PluginModule> {
        let path = self.library_path(module);
        if !path.exists() {
            tracing::debug!("No plugin library at {}", path.display());
            return Err(PluginError::NotFound {
                alias: alias.to_string(),
                module: module.to_string(),
            });
        }
        self.load_library(alias, module, &path)
    }

    fn available(&self) -> Vec<String> {
        let mut modules = Vec::new();
        collect_libraries(&self.plugin_dir, "", &mut modules);
        modules.sort();
        modules
    }
}

/// Walk `dir`, turning every library file into a dotted module path
fn collect_libraries(dir: &Path, prefix: &str, out: &mut Vec<String>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read plugin directory {}: {}", dir.display(), e);
            return;
        }
    };

    let (lib_prefix, lib_suffix) = (std::env::consts::DLL_PREFIX, std::env::consts::DLL_SUFFIX);

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // Skip hidden entries
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            collect_libraries(&path, &format!("{}{}.", prefix, name), out);
        } else if let Some(stem) = name.strip_prefix(lib_prefix).and_then(|n| n.strip_suffix(lib_suffix)) {
            out.push(format!("{}{}", prefix, stem));
        }
    }
}
