use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "DAYBYDAY_DATA_DIR";
pub const LOG_ENV: &str = "DAYBYDAY_LOG";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_DIR_NAME: &str = "daybyday";

/// Process-level settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_spec: String,
    pub app_version: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let data_dir = non_empty(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                non_empty("HOME").map(|home| {
                    PathBuf::from(home)
                        .join(".local")
                        .join("share")
                        .join(DEFAULT_DIR_NAME)
                })
            })
            .unwrap_or_else(|| PathBuf::from(format!(".{DEFAULT_DIR_NAME}")));

        let log_spec = non_empty(LOG_ENV)
            .or_else(|| non_empty("RUST_LOG"))
            .unwrap_or_else(|| default_log_spec().to_string());

        Self {
            data_dir,
            log_spec,
            app_version: APP_VERSION.to_string(),
        }
    }
}

// Dependency logs stay at WARN; our crate is more verbose in debug builds.
fn default_log_spec() -> &'static str {
    if cfg!(debug_assertions) {
        "warn,daybyday_lib=debug,daybyday=debug"
    } else {
        "warn,daybyday_lib=info,daybyday=info"
    }
}
