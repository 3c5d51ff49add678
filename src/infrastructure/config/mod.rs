//! Configuration management
//!
//! The configuration file is a YAML mapping of top-level sections. `Bot`
//! holds host settings, `Plugins` maps plugin aliases to module paths, and
//! every other section carries the options of the plugin with that alias.

mod options;

pub use options::PluginOptions;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::application::errors::{ConfigError, PluginError};

/// Section holding alias -> module path pairs
pub const PLUGINS_SECTION: &str = "Plugins";

/// Section holding host settings
pub const BOT_SECTION: &str = "Bot";

/// One entry of the `Plugins` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSpec {
    pub alias: String,
    pub module: String,
}

impl PluginSpec {
    pub fn new(alias: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            module: module.into(),
        }
    }
}

/// Host settings from the `Bot` section
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotSettings {
    pub name: String,
    pub prefix: String,
    pub plugin_dir: PathBuf,
    pub console: ConsoleSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleSettings {
    pub nickname: String,
    pub groups: Vec<String>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            name: "modbot".to_string(),
            prefix: "!".to_string(),
            plugin_dir: PathBuf::from("./plugins"),
            console: ConsoleSettings::default(),
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            nickname: "console".to_string(),
            groups: vec!["Server Admin".to_string()],
        }
    }
}

/// Mutable, ordered set of configuration sections.
///
/// The plugin loader consumes the `Plugins` section and every per-plugin
/// section it matches; anything left over stays available to other readers.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: Mapping,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        match value {
            Value::Mapping(sections) => Ok(Self { sections }),
            Value::Null => Ok(Self::default()),
            _ => Err(ConfigError::InvalidValue(
                "top level of the configuration must be a mapping of sections".to_string(),
            )),
        }
    }

    pub fn from_mapping(sections: Mapping) -> Self {
        Self { sections }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.sections).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Remove and return a section, keeping the order of the others
    pub fn take_section(&mut self, name: &str) -> Option<Value> {
        self.sections.shift_remove(name)
    }

    pub fn set_section(&mut self, name: impl Into<String>, value: Value) {
        self.sections.insert(Value::String(name.into()), value);
    }

    pub fn section_names(&self) -> Vec<String> {
        self.sections
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect()
    }

    /// Remove the `Plugins` section and turn it into ordered plugin specs.
    ///
    /// A missing section yields no specs. Anything other than a mapping of
    /// non-empty strings to non-empty strings is a malformed spec.
    pub fn take_plugin_specs(&mut self) -> Result<Vec<PluginSpec>, PluginError> {
        let section = match self.take_section(PLUGINS_SECTION) {
            Some(Value::Mapping(section)) => section,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(other) => {
                return Err(PluginError::MalformedSpec(format!(
                    "'{}' must map aliases to module paths, got {:?}",
                    PLUGINS_SECTION, other
                )))
            }
        };

        section
            .into_iter()
            .map(|(alias, module)| match (alias, module) {
                (Value::String(alias), Value::String(module)) if !alias.is_empty() && !module.is_empty() => {
                    Ok(PluginSpec::new(alias, module))
                }
                (alias, module) => Err(PluginError::MalformedSpec(format!(
                    "expected 'alias: module.path', got {:?}: {:?}",
                    alias, module
                ))),
            })
            .collect()
    }

    /// Read the `Bot` section without consuming it
    pub fn bot_settings(&self) -> Result<BotSettings, ConfigError> {
        match self.section(BOT_SECTION) {
            Some(value) => serde_yaml::from_value(value.clone())
                .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", BOT_SECTION, e))),
            None => Ok(BotSettings::default()),
        }
    }

    /// Apply environment overrides to the `Bot` section
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        let mut settings = self.bot_settings()?;
        let mut changed = false;

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            settings.prefix = prefix;
            changed = true;
        }

        if let Ok(dir) = std::env::var("BOT_PLUGIN_DIR") {
            settings.plugin_dir = PathBuf::from(dir);
            changed = true;
        }

        if changed {
            let value = serde_yaml::to_value(&settings).map_err(|e| ConfigError::Parse(e.to_string()))?;
            self.set_section(BOT_SECTION, value);
        }
        Ok(())
    }

    /// Configuration written by `init-config`: host settings plus the built-in plugins
    pub fn example() -> Self {
        let mut config = Self::default();

        if let Ok(bot) = serde_yaml::to_value(BotSettings::default()) {
            config.set_section(BOT_SECTION, bot);
        }

        let mut plugins = Mapping::new();
        plugins.insert("utils".into(), "utils".into());
        plugins.insert("greeter".into(), "greeter".into());
        config.set_section(PLUGINS_SECTION, Value::Mapping(plugins));

        let mut utils = Mapping::new();
        utils.insert("enable_dry_run".into(), false.into());
        config.set_section("utils", Value::Mapping(utils));

        let mut greeter = Mapping::new();
        greeter.insert("welcome".into(), "Welcome, {nickname}!".into());
        config.set_section("greeter", Value::Mapping(greeter));

        config
    }
}
