use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;
use crate::store::StoreError;

pub const THEME_KEY: &str = "theme";
pub const ONBOARDING_KEY: &str = "hasCompletedOnboarding";
pub const LAST_VERSION_KEY: &str = "lastVersion";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    /// Resolves the mode against the platform preference.
    pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
        match self {
            ThemeMode::Light => false,
            ThemeMode::Dark => true,
            ThemeMode::System => system_prefers_dark,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme {0:?} (expected light, dark or system)")]
pub struct ParseThemeError(String);

impl FromStr for ThemeMode {
    type Err = ParseThemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            _ => Err(ParseThemeError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Preferences {
    pub theme: ThemeMode,
    pub has_completed_onboarding: bool,
    pub last_version: Option<String>,
}

impl Preferences {
    pub fn onboarding_required(&self, current_version: &str) -> bool {
        !self.has_completed_onboarding || self.last_version.as_deref() != Some(current_version)
    }
}

/// Theme and onboarding values, each under its own key. Never touches the task collection.
///
/// Values are stored as plain text (`dark`, `true`, `1.0.0`), the form the
/// mobile app wrote. JSON-quoted strings are accepted on read.
pub struct PreferenceStore<S> {
    storage: S,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn load(&self) -> Result<Preferences, StoreError> {
        Ok(Preferences {
            theme: self.read(THEME_KEY).await?.unwrap_or_default(),
            has_completed_onboarding: self.read(ONBOARDING_KEY).await?.unwrap_or(false),
            last_version: self.read(LAST_VERSION_KEY).await?,
        })
    }

    /// Loads each key on its own; one that cannot be read falls back to its default.
    pub async fn load_or_default(&self) -> Preferences {
        Preferences {
            theme: self.read_or_default(THEME_KEY).await.unwrap_or_default(),
            has_completed_onboarding: self.read_or_default(ONBOARDING_KEY).await.unwrap_or(false),
            last_version: self.read_or_default(LAST_VERSION_KEY).await,
        }
    }

    pub async fn save_theme(&self, theme: ThemeMode) -> Result<(), StoreError> {
        self.write(THEME_KEY, theme.as_str()).await
    }

    pub async fn complete_onboarding(&self, current_version: &str) -> Result<(), StoreError> {
        self.write(ONBOARDING_KEY, "true").await?;
        self.write(LAST_VERSION_KEY, current_version).await
    }

    async fn read<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.storage.get(key).await.map_err(StoreError::StorageRead)?;
        match raw {
            None => Ok(None),
            Some(raw) => unquote(&raw)
                .parse()
                .map(Some)
                .map_err(|err| StoreError::CorruptData(format!("{key} does not parse: {err}"))),
        }
    }

    async fn read_or_default<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.read(key).await {
            Ok(value) => value,
            Err(error) => {
                log::warn!("preference {key} unavailable, using default: {error}");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set(key, value)
            .await
            .map_err(StoreError::StorageWrite)
    }
}

fn unquote(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.trim().to_string())
}
