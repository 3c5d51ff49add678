//! modbot - a chat bot host built around plugins
//!
//! Plugins are loaded by alias from the `Plugins` configuration section,
//! attach command handlers, event observers and exit hooks to a `Registry`,
//! and are set up with their own configuration section once every plugin has
//! been loaded.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
