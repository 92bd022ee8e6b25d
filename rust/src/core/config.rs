use std::path::Path;

use serde::Deserialize;

use super::queue::{LinkFileFormat, LoadError, DEFAULT_SEPARATOR};

pub const CONFIG_FILE_NAME: &str = "tapwrite_config.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cell separator for multi-link lines. Only the first character is used.
    pub separator: Option<String>,
    /// Line prefixes that mark a line as a single URI (never split).
    pub uri_prefixes: Option<Vec<String>>,
    /// Refuse to load files with more links than this.
    pub max_links: Option<u32>,
}

impl AppConfig {
    pub fn link_file_format(&self) -> LinkFileFormat {
        let defaults = LinkFileFormat::default();
        let separator = self
            .separator
            .as_deref()
            .and_then(|s| s.chars().next())
            .unwrap_or(DEFAULT_SEPARATOR);
        let uri_prefixes: Vec<String> = self
            .uri_prefixes
            .iter()
            .flatten()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        LinkFileFormat {
            separator,
            uri_prefixes: if uri_prefixes.is_empty() {
                defaults.uri_prefixes
            } else {
                uri_prefixes
            },
        }
    }

    /// Enforce `max_links` on a parsed file of `count` links.
    pub fn check_link_count(&self, count: usize) -> Result<(), LoadError> {
        match self.max_links {
            Some(max) if count > max as usize => Err(LoadError::TooManyLinks { count, max }),
            _ => Ok(()),
        }
    }
}

pub fn load_app_config(data_dir: &str) -> AppConfig {
    load_app_config_file(&Path::new(data_dir).join(CONFIG_FILE_NAME))
}

/// Missing or malformed files fall back to defaults.
pub fn load_app_config_file(path: &Path) -> AppConfig {
    let Ok(bytes) = std::fs::read(path) else {
        return AppConfig::default();
    };
    match serde_json::from_slice::<AppConfig>(&bytes) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(%e, path = %path.display(), "ignoring malformed config");
            AppConfig::default()
        }
    }
}
