//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Plugin loading, registration and lifecycle errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin '{alias}' not found: no module named '{module}'")]
    NotFound { alias: String, module: String },

    #[error("Failed to load plugin '{alias}' from '{module}': {reason}")]
    Load {
        alias: String,
        module: String,
        reason: String,
    },

    #[error("Malformed plugin spec: {0}")]
    MalformedSpec(String),

    #[error("Cannot resolve the plugin owning a setup routine: {0}")]
    SetupResolution(String),

    #[error("Setup of plugin '{plugin}' failed: {reason}")]
    Setup { plugin: String, reason: String },

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Invalid plugin options: {0}")]
    Options(String),

    #[error("Plugin '{plugin}' failed: {reason}")]
    Runtime { plugin: String, reason: String },

    #[error("Shutdown hook failed: {0}")]
    Hook(String),
}

pub type PluginResult<T> = Result<T, PluginError>;

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Permission denied: {sender} may not use '{command}'")]
    PermissionDenied { command: String, sender: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
