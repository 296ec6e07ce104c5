//! TOML-based settings snapshot.
//!
//! Stores the keybindings, the transcript header text and the preset
//! catalog. Loaded once at session start; a partial file is valid and
//! missing fields fall back to the built-in defaults field by field.
//!
//! Stored at `~/.config/frametimer/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{ConfigError, CoreError};
use crate::keys::Keybindings;
use crate::presets::{ActivePreset, PresetCatalog, PresetSink};

fn default_copy_header() -> String {
    "Mod edit (Name):".to_string()
}

/// The settings snapshot read at session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default = "default_copy_header")]
    pub copy_header_text: String,
    #[serde(default)]
    pub presets: PresetCatalog,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keybindings: Keybindings::default(),
            copy_header_text: default_copy_header(),
            presets: PresetCatalog::built_in(),
        }
    }
}

impl Settings {
    fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults out on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or the
    /// defaults cannot be written.
    pub fn load() -> Result<Self, CoreError> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let mut settings: Settings =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                settings.presets.repair();
                Ok(settings)
            }
            Err(_) => {
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    fn pointer_of(key: &str) -> String {
        format!("/{}", key.replace('.', "/"))
    }

    /// Get a settings value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.pointer(&Self::pointer_of(key))? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by dot-separated key, preserving the field's
    /// existing type.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be
    /// parsed as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        let slot = json
            .pointer_mut(&Self::pointer_of(key))
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let new_value = match &*slot {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    let n = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot represent '{value}'")))?
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.to_string()),
        };
        *slot = new_value;
        *self = serde_json::from_value(json)?;
        Ok(())
    }
}

/// Preset write-back through the settings file (last-write-wins).
pub struct SettingsPresetSink {
    path: PathBuf,
}

impl SettingsPresetSink {
    pub fn new() -> Result<Self, CoreError> {
        Ok(Self {
            path: Settings::path()?,
        })
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PresetSink for SettingsPresetSink {
    fn persist_active(&mut self, active: &ActivePreset) -> Result<(), CoreError> {
        let mut settings = Settings::load_from(&self.path)?;
        settings.presets.active = active.clone();
        settings.save_to(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn partial_snapshot_is_valid_field_by_field() {
        let parsed: Settings = toml::from_str(r#"copy_header_text = "Run notes:""#).unwrap();
        assert_eq!(parsed.copy_header_text, "Run notes:");
        assert_eq!(parsed.keybindings, Keybindings::default());
        // Untouched presets deserialize empty; repair is the loader's job.
        assert!(parsed.presets.data.is_empty());
    }

    #[test]
    fn load_repairs_malformed_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "copy_header_text = \"x\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.presets, PresetCatalog::built_in());
    }

    #[test]
    fn load_writes_defaults_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let settings = Settings::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let settings = Settings::default();
        assert_eq!(
            settings.get("copy_header_text").as_deref(),
            Some("Mod edit (Name):")
        );
        assert_eq!(settings.get("keybindings.end_run.ctrl").as_deref(), Some("true"));
        assert_eq!(settings.get("presets.active.group").as_deref(), Some("General"));
        assert!(settings.get("no.such.key").is_none());
    }

    #[test]
    fn set_preserves_field_types() {
        let mut settings = Settings::default();
        settings.set("keybindings.end_run.ctrl", "false").unwrap();
        assert!(!settings.keybindings.end_run.ctrl);
        settings.set("copy_header_text", "New header").unwrap();
        assert_eq!(settings.copy_header_text, "New header");
        assert!(settings.set("keybindings.end_run.ctrl", "maybe").is_err());
        assert!(settings.set("unknown.key", "1").is_err());
    }

    #[test]
    fn preset_sink_writes_back_active_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Settings::default().save_to(&path).unwrap();

        let mut sink = SettingsPresetSink::at(path.clone());
        let active = ActivePreset {
            group: "General".into(),
            sub: "Default".into(),
        };
        sink.persist_active(&active).unwrap();
        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.presets.active, active);
    }
}
