//! Application settings with per-field fallback to defaults.
//!
//! Settings live in one JSON document owned by the shell. Stored documents
//! come from older versions of the app or from hand edits, so loading never
//! trusts the document shape: each field is reconciled individually and
//! anything missing, mistyped, or unknown falls back to its default instead
//! of poisoning the rest of the settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed writing settings to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed serializing settings: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAi,
    DeepSeek,
}

impl AiProvider {
    fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "openai" => Some(AiProvider::OpenAi),
            "deepseek" => Some(AiProvider::DeepSeek),
            _ => None,
        }
    }
}

/// Connection settings for the AI endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub enabled: bool,
    pub provider: AiProvider,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: AiProvider::OpenAi,
            api_key: String::new(),
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            model: DEFAULT_AI_MODEL.to_string(),
        }
    }
}

impl AiSettings {
    /// True when generation can actually be attempted.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub theme: Theme,
    pub language: String,
    pub ai: AiSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            language: DEFAULT_LANGUAGE.to_string(),
            ai: AiSettings::default(),
        }
    }
}

impl AppSettings {
    /// Builds settings from an untrusted JSON document, field by field.
    ///
    /// Unknown fields are ignored; missing or mistyped fields take their
    /// default. Empty strings count as missing for fields where an empty
    /// value is never meaningful.
    #[must_use]
    pub fn reconcile(document: &Value) -> Self {
        let defaults = Self::default();

        let theme = document
            .get("theme")
            .and_then(Theme::from_value)
            .unwrap_or(defaults.theme);

        let language = document
            .get("language")
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.language);

        let ai_document = document.get("ai").unwrap_or(&Value::Null);
        let ai_defaults = defaults.ai;
        let ai = AiSettings {
            enabled: ai_document
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(ai_defaults.enabled),
            provider: ai_document
                .get("provider")
                .and_then(AiProvider::from_value)
                .unwrap_or(ai_defaults.provider),
            api_key: ai_document
                .get("apiKey")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(ai_defaults.api_key),
            base_url: ai_document
                .get("baseUrl")
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(ai_defaults.base_url),
            model: ai_document
                .get("model")
                .and_then(Value::as_str)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .unwrap_or(ai_defaults.model),
        };

        Self {
            theme,
            language,
            ai,
        }
    }
}

/// File-backed settings persistence.
///
/// Loading is infallible by design: settings are convenience data, so a
/// missing or corrupt file degrades to defaults with a log line rather than
/// blocking startup.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn load(&self) -> AppSettings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return AppSettings::default();
            }
            Err(error) => {
                log::warn!(
                    "failed reading settings from {}: {error}; using defaults",
                    self.path.display()
                );
                return AppSettings::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(document) => AppSettings::reconcile(&document),
            Err(error) => {
                log::warn!(
                    "failed parsing settings from {}: {error}; using defaults",
                    self.path.display()
                );
                AppSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        let raw = serde_json::to_string_pretty(settings).map_err(SettingsError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        fs::write(&self.path, raw).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Owns the active theme and the single listener notified when it changes.
///
/// Installing a listener replaces the previous one, so a remounted settings
/// view never leaves a stale listener behind.
#[derive(Default)]
pub struct ThemeController {
    theme: Option<Theme>,
    listener: Option<Box<dyn FnMut(Theme) + Send>>,
}

impl ThemeController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the change listener, dropping any previous one, and fires it
    /// immediately with the current theme if one is set.
    pub fn subscribe(&mut self, listener: impl FnMut(Theme) + Send + 'static) {
        let mut listener = Box::new(listener);
        if let Some(theme) = self.theme {
            listener(theme);
        }
        self.listener = Some(listener);
    }

    pub fn unsubscribe(&mut self) {
        self.listener = None;
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = Some(theme);
        if let Some(listener) = self.listener.as_mut() {
            listener(theme);
        }
    }

    #[must_use]
    pub fn theme(&self) -> Option<Theme> {
        self.theme
    }
}
