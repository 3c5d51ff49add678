//! Shared-library plugins
//!
//! A plugin built as a `cdylib` exposes `bot_plugin_create` (see
//! `declare_plugin!`) and is found under the configured plugin directory.

pub mod loader;

pub use loader::LibraryLoader;
