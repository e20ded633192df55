//! Loads the server settings from a YAML file and the environment, and checks
//! the store connection parameters before anything tries to use them.

use std::path::Path;

use serde::Deserialize;

/// The environment variable that overrides the store URL from the file.
pub const STORE_URL_VAR: &str = "CONSUMPTION_STORE_URL";
/// The environment variable that overrides the store access key from the file.
pub const STORE_KEY_VAR: &str = "CONSUMPTION_STORE_KEY";

/// The ways the settings can be unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("could not read {path}: {reason}")]
    Io { path: String, reason: String },

    /// The settings file is not valid YAML for [Config].
    #[error("could not parse {path}: {reason}")]
    InvalidYaml { path: String, reason: String },

    /// A required value was not provided.
    #[error("{field} is not set")]
    MissingField { field: &'static str },

    /// A value was left as the example placeholder.
    #[error("{field} still holds the placeholder value \"{value}\"")]
    Placeholder { field: &'static str, value: String },

    /// A value was provided but cannot be used.
    #[error("{field} is invalid: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// The server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The base URL of the hosted store, e.g. `https://abc.example.co`.
    pub store_url: Option<String>,
    /// The access key sent with every store request.
    pub store_key: Option<String>,
    /// The canonical timezone name used to work out today's date.
    pub local_timezone: String,
    /// The number of transactions shown per page.
    pub page_size: u64,
    /// How many of the most recently recorded transactions to keep loaded.
    pub recent_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: None,
            store_key: None,
            local_timezone: "Etc/UTC".to_owned(),
            page_size: 10,
            recent_limit: 100,
        }
    }
}

/// Connection parameters that have passed [Config::store_credentials].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl Config {
    /// Read the settings from `path` and apply the environment overrides.
    ///
    /// A missing file is not an error: the defaults and the environment are
    /// used instead.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::from_file(path)?.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Read the settings from `path` without looking at the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;

        Self::from_yaml(&content).map_err(|error| match error {
            ConfigError::InvalidYaml { reason, .. } => ConfigError::InvalidYaml {
                path: path.display().to_string(),
                reason,
            },
            error => error,
        })
    }

    /// Parse the settings from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(content).map_err(|error| ConfigError::InvalidYaml {
                path: "settings".to_owned(),
                reason: error.to_string(),
            })?;
        config.validate()?;

        Ok(config)
    }

    /// Replace the store URL and key with the values of [STORE_URL_VAR] and
    /// [STORE_KEY_VAR] when `lookup` has them.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(STORE_URL_VAR) {
            self.store_url = Some(url);
        }

        if let Some(key) = lookup(STORE_KEY_VAR) {
            self.store_key = Some(key);
        }

        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.recent_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recent_limit",
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }

    /// The store URL and key, if both are set to real values.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is missing, empty or a placeholder,
    /// or if the URL does not use http or https.
    pub fn store_credentials(&self) -> Result<StoreCredentials, ConfigError> {
        let url = required_value("store_url", self.store_url.as_deref())?;
        let key = required_value("store_key", self.store_key.as_deref())?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "store_url",
                reason: format!("\"{url}\" must start with http:// or https://"),
            });
        }

        Ok(StoreCredentials {
            url: url.to_owned(),
            key: key.to_owned(),
        })
    }
}

fn required_value<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingField { field })?;

    if is_placeholder(value) {
        return Err(ConfigError::Placeholder {
            field,
            value: value.to_owned(),
        });
    }

    Ok(value)
}

/// Whether `value` looks like an example value copied from the docs, e.g.
/// `your-project-url` or `<anon key>`.
fn is_placeholder(value: &str) -> bool {
    let lowercase = value.to_lowercase();

    lowercase.contains("your-")
        || lowercase.contains("your_")
        || (value.starts_with('<') && value.ends_with('>'))
}
