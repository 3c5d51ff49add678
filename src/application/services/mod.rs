//! Application services - Business logic orchestration

pub mod command_service;
pub mod module_loader;
pub mod plugin_host;
pub mod shutdown_service;

pub use command_service::CommandService;
pub use module_loader::{config_section_name, LoadedPlugin, LoadedPlugins, ModuleLoader};
pub use plugin_host::PluginHost;
pub use shutdown_service::{ShutdownCoordinator, ShutdownHook, ShutdownReport};
