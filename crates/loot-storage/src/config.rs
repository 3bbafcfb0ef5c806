use crate::shared::SharedSource;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_ITEM_LINK_BASE: &str = "https://www.wowhead.com/classic/item=";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub db_path: Option<PathBuf>,
    pub shared_source: Option<String>,
    pub item_link_base: String,
    pub respect_min_quality: bool,
    pub fetch_on_start: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            shared_source: None,
            item_link_base: DEFAULT_ITEM_LINK_BASE.to_string(),
            respect_min_quality: false,
            fetch_on_start: true,
        }
    }
}

impl TrackerConfig {
    /// Config file plus `LOOT_DB_PATH` / `LOOT_SHARED_SOURCE` overrides.
    pub fn load() -> Self {
        let mut config = load_config(&config_path());
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(path) = env::var("LOOT_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = Some(PathBuf::from(path.trim()));
            }
        }
        if let Ok(source) = env::var("LOOT_SHARED_SOURCE") {
            if !source.trim().is_empty() {
                self.shared_source = Some(source.trim().to_string());
            }
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join("loot-tracker/loot.db"),
            None => PathBuf::from("loot.db"),
        }
    }

    /// Configured shared source; an unusable value is logged and ignored.
    pub fn shared_source(&self) -> Option<SharedSource> {
        let raw = self.shared_source.as_deref()?;
        match raw.parse::<SharedSource>() {
            Ok(source) => Some(source),
            Err(err) => {
                warn!(value = raw, error = %err, "ignoring shared_source");
                None
            }
        }
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var("LOOT_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loot-tracker/config.toml")
}

/// Missing file gives defaults; an unparsable one is reported and ignored.
pub fn load_config(path: &Path) -> TrackerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return TrackerConfig::default();
    };
    match toml::from_str::<TrackerConfig>(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to parse config; using defaults");
            TrackerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_gives_defaults() {
        let config = load_config(Path::new("/nonexistent/loot-tracker/config.toml"));
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.item_link_base, DEFAULT_ITEM_LINK_BASE);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "shared_source = \"https://example.org/loot.json\"").expect("write");
        writeln!(file, "respect_min_quality = true").expect("write");

        let config = load_config(file.path());
        assert!(config.respect_min_quality);
        assert!(config.fetch_on_start);
        assert_eq!(
            config.shared_source(),
            Some(SharedSource::Url("https://example.org/loot.json".to_string()))
        );
    }

    #[test]
    fn broken_file_falls_back() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "respect_min_quality = \"maybe").expect("write");
        assert_eq!(load_config(file.path()), TrackerConfig::default());
    }

    #[test]
    fn explicit_db_path_wins() {
        let config = TrackerConfig {
            db_path: Some(PathBuf::from("/tmp/loot.db")),
            ..TrackerConfig::default()
        };
        assert_eq!(config.resolved_db_path(), PathBuf::from("/tmp/loot.db"));
    }
}
