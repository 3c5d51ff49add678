//! Plugin system
//!
//! Plugins are registered in a static catalog (built-ins, or anything the
//! host adds) or loaded from shared libraries. Either way a plugin is a
//! `Plugin` value whose `register` method attaches it to the registry.

pub mod catalog;
pub mod greeter;
pub mod trait_def;
pub mod utils;

pub use catalog::StaticCatalog;
pub use trait_def::{Plugin, PluginModule, PluginSource, SourceChain};

/// Declare the entry point of a shared-library plugin.
///
/// ```ignore
/// modbot::declare_plugin!(Weather::default());
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($ctor:expr) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn bot_plugin_create() -> *mut dyn $crate::plugins::Plugin {
            let plugin: Box<dyn $crate::plugins::Plugin> = Box::new($ctor);
            Box::into_raw(plugin)
        }
    };
}
