//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Plugins: Shared-library plugin loading
//! - Adapters: Connection implementations (console)

pub mod adapters;
pub mod config;
pub mod plugins;
