use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::application::errors::{PluginError, PluginResult};

/// Named options handed to a plugin's setup routine.
///
/// Built from the plugin's configuration section, or empty when the plugin
/// has no section and should fall back to its own defaults.
#[derive(Clone, Default, PartialEq)]
pub struct PluginOptions {
    values: Mapping,
    configured: bool,
}

impl PluginOptions {
    /// Options for an unconfigured plugin
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Options taken from a configuration section
    pub fn from_section(plugin: &str, section: Value) -> PluginResult<Self> {
        let values = match section {
            Value::Mapping(values) => values,
            Value::Null => Mapping::new(),
            other => {
                return Err(PluginError::Options(format!(
                    "section '{}' must be a mapping of named options, got {:?}",
                    plugin, other
                )))
            }
        };
        Ok(Self {
            values,
            configured: true,
        })
    }

    /// True if the options came from a configuration section
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().filter_map(Value::as_str)
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Read a single option, `None` if it is absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> PluginResult<Option<T>> {
        self.values
            .get(key)
            .map(|value| {
                serde_yaml::from_value(value.clone())
                    .map_err(|e| PluginError::Options(format!("option '{}': {}", key, e)))
            })
            .transpose()
    }

    /// Deserialize all options into the plugin's own settings type.
    ///
    /// Give `T` `#[serde(default)]` so unconfigured plugins get their defaults.
    pub fn parse<T: DeserializeOwned>(&self) -> PluginResult<T> {
        serde_yaml::from_value(Value::Mapping(self.values.clone())).map_err(|e| PluginError::Options(e.to_string()))
    }
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.configured {
            return f.write_str("<defaults>");
        }
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k.as_str().unwrap_or("?"), v)))
            .finish()
    }
}
