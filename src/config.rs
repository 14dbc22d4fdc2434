use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};
use thiserror::Error;

/// Config file name, kept beside the download cache it describes.
pub const CONFIG_FILE: &str = "modconfig.json";

/// A config file that exists but fails to parse is fatal: overwriting it
/// would silently discard the user's flags.
#[derive(Debug, Error)]
#[error("corrupt mod config {}: {source}", .path.display())]
pub struct ConfigCorrupt {
    pub path: std::path::PathBuf,
    #[source]
    pub source: serde_json::Error,
}

/// Durable record of user intent, rewritten in full after every
/// reconciliation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModConfig {
    #[serde(default)]
    pub mods: BTreeMap<String, ModFlags>,
    #[serde(default)]
    pub game_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModFlags {
    #[serde(default = "default_update")]
    pub update: bool,
}

impl Default for ModFlags {
    fn default() -> Self {
        Self {
            update: default_update(),
        }
    }
}

fn default_update() -> bool {
    true
}

impl ModConfig {
    /// Load the config, writing a minimal default file on first run.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let raw =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            let config = serde_json::from_str(&raw).map_err(|source| ConfigCorrupt {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(config);
        }

        let config = ModConfig::default();
        config.save(path)?;
        Ok(config)
    }

    /// Full-file overwrite through a temp file and rename, so a crash
    /// mid-write leaves the previous config on disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("serialize mod config")?;
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, raw).with_context(|| format!("write {}", temp.display()))?;
        if path.exists() {
            let _ = fs::remove_file(path);
        }
        fs::rename(&temp, path).with_context(|| format!("finalize {}", path.display()))?;
        Ok(())
    }

    /// Auto-update flag for a mod, `true` for mods never seen before.
    pub fn update_flag(&self, mod_id: &str) -> bool {
        self.mods
            .get(mod_id)
            .map(|flags| flags.update)
            .unwrap_or_else(default_update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_run_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = ModConfig::load_or_create(&path).unwrap();
        assert!(config.mods.is_empty());
        assert!(config.game_path.is_empty());
        assert!(path.exists());

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("mods").unwrap().as_object().unwrap().is_empty());
    }

    #[test]
    fn round_trips_flags_and_game_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = ModConfig::default();
        config.game_path = "/games/astroneer".to_string();
        config.mods.insert(
            "Example".to_string(),
            ModFlags { update: false },
        );
        config.save(&path).unwrap();

        let loaded = ModConfig::load_or_create(&path).unwrap();
        assert_eq!(loaded.game_path, "/games/astroneer");
        assert!(!loaded.update_flag("Example"));
        assert!(loaded.update_flag("NeverSeen"));
    }

    #[test]
    fn corrupt_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{\"mods\": [").unwrap();

        let err = ModConfig::load_or_create(&path).unwrap_err();
        assert!(err.downcast_ref::<ConfigCorrupt>().is_some());
        // the corrupt file is left untouched for the user to inspect
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"mods\": [");
    }

    #[test]
    fn older_configs_without_game_path_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"mods":{"Foo":{}}}"#).unwrap();

        let config = ModConfig::load_or_create(&path).unwrap();
        assert!(config.update_flag("Foo"));
        assert!(config.game_path.is_empty());
    }
}
