//! User settings
//!
//! Settings are the per-user knobs edited from the REPL or the `settings`
//! command, as opposed to [`crate::config::Config`], which describes the
//! deployment (endpoint, storage location). They live in the record store
//! under [`SETTINGS_KEY`] and are only written on an explicit save.

use crate::error::{ChatError, Result};
use crate::storage::RecordStore;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};

/// Record key holding the serialized settings
pub const SETTINGS_KEY: &str = "settings";

/// Record key holding the API key
pub const API_KEY_KEY: &str = "api_key";

/// Names accepted by [`Settings::set`]
pub const SETTING_NAMES: [&str; 5] = [
    "temperature",
    "max_tokens",
    "stream_response",
    "syntax_highlight",
    "theme",
];

/// Process-wide chat settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum response tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Stored and editable, but the transport always reads the full body
    #[serde(default = "default_true")]
    pub stream_response: bool,

    /// Render assistant replies as markdown
    #[serde(default = "default_true")]
    pub syntax_highlight: bool,

    #[serde(default)]
    pub theme: Theme,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stream_response: true,
            syntax_highlight: true,
            theme: Theme::default(),
        }
    }
}

impl Settings {
    /// Load settings from the store
    ///
    /// A missing record yields defaults. A record that fails to parse is
    /// logged and also yields defaults, so a corrupt value never blocks
    /// startup.
    pub fn load(store: &dyn RecordStore) -> Result<Self> {
        let Some(raw) = store.get(SETTINGS_KEY)? else {
            tracing::debug!("No stored settings, using defaults");
            return Ok(Self::default());
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!("Ignoring malformed stored settings: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Persist settings to the store
    pub fn save(&self, store: &dyn RecordStore) -> Result<()> {
        self.validate()?;
        let raw = serde_json::to_string(self).map_err(ChatError::from)?;
        store.set(SETTINGS_KEY, &raw)?;
        tracing::debug!("Saved settings");
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `ChatError::InvalidSetting` when a value is out of range
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::InvalidSetting(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ))
            .into());
        }
        if self.max_tokens == 0 {
            return Err(ChatError::InvalidSetting(
                "max_tokens must be greater than 0".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Update one setting from its textual form
    ///
    /// The change is validated but not persisted.
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::settings::Settings;
    /// use quillchat::theme::Theme;
    ///
    /// let mut settings = Settings::default();
    /// settings.set("theme", "light").unwrap();
    /// settings.set("max-tokens", "512").unwrap();
    /// assert_eq!(settings.theme, Theme::Light);
    /// assert_eq!(settings.max_tokens, 512);
    /// assert!(settings.set("temperature", "9").is_err());
    /// ```
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        let value = value.trim();
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "temperature" => updated.temperature = parse_value(name, value)?,
            "max_tokens" => updated.max_tokens = parse_value(name, value)?,
            "stream_response" => updated.stream_response = parse_bool(name, value)?,
            "syntax_highlight" => updated.syntax_highlight = parse_bool(name, value)?,
            "theme" => {
                updated.theme = Theme::parse_str(value).map_err(ChatError::InvalidSetting)?
            }
            other => {
                return Err(ChatError::InvalidSetting(format!(
                    "Unknown setting: {}. Must be one of: {}",
                    other,
                    SETTING_NAMES.join(", ")
                ))
                .into())
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Name/value pairs for display
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("temperature", format!("{:.1}", self.temperature)),
            ("max_tokens", self.max_tokens.to_string()),
            ("stream_response", self.stream_response.to_string()),
            ("syntax_highlight", self.syntax_highlight.to_string()),
            ("theme", self.theme.to_string()),
        ]
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        ChatError::InvalidSetting(format!("Invalid value for {}: {}", name, value)).into()
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ChatError::InvalidSetting(format!("Invalid value for {}: {}", name, value)).into()),
    }
}

/// Read the stored API key, treating an empty record as absent
pub fn load_api_key(store: &dyn RecordStore) -> Result<Option<String>> {
    Ok(store
        .get(API_KEY_KEY)?
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()))
}

/// Store the API key; an empty key removes the record
pub fn save_api_key(store: &dyn RecordStore, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        store.remove(API_KEY_KEY)
    } else {
        store.set(API_KEY_KEY, key)
    }
}
