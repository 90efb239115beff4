use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::control::DEFAULT_TURN_WARNING_THRESHOLD;
use crate::SurfaceError;

/// Persisted surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Substring matched against MIDI port names
    pub midi_device: String,
    /// MIDI client name announced to the OS
    pub client_name: String,
    /// Long press timeout applied to every control, in seconds
    pub long_press_timeout_secs: f64,
    /// Turn magnitude above which a warning is logged
    pub turn_warning_threshold: u8,
    /// Re-send cached LEDs for the active layer after connecting
    pub refresh_leds_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            midi_device: "X-TOUCH MINI".to_string(),
            client_name: "cockpit".to_string(),
            long_press_timeout_secs: 0.0,
            turn_warning_threshold: DEFAULT_TURN_WARNING_THRESHOLD,
            refresh_leds_on_start: true,
        }
    }
}

/// Configuration manager for cockpit settings.
/// Configuration is stored in config.json in the working directory by default.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
    /// Creation time of the file on disk, written back on every save
    created_at: Option<String>,
}

/// Available configuration options with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub midi_device: ConfigOption<String>,
    pub client_name: ConfigOption<String>,
    pub long_press_timeout_secs: ConfigOption<f64>,
    pub turn_warning_threshold: ConfigOption<u8>,
    pub refresh_leds_on_start: ConfigOption<bool>,
}

/// Configuration option with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub description: String,
    pub requires_restart: bool,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

impl ConfigManager {
    /// Create a new configuration manager.
    /// If no path is provided, defaults to 'config.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));

        Self {
            config_path,
            settings: Settings::default(),
            created_at: None,
        }
    }

    /// Load settings from the configuration file.
    /// Writes and returns the defaults if the file doesn't exist.
    pub fn load(&mut self) -> Result<Settings, SurfaceError> {
        if !self.config_path.exists() {
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SurfaceError::ConfigRead(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| SurfaceError::ConfigParse(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        Self::validate_settings(&config_file.settings).map_err(SurfaceError::ConfigValidation)?;

        self.settings = config_file.settings;
        self.created_at = Some(config_file.created_at).filter(|created| !created.is_empty());
        Ok(self.settings.clone())
    }

    /// Save current settings to the configuration file.
    /// Keeps the file's original creation time once it has been loaded or written.
    pub fn save(&mut self) -> Result<(), SurfaceError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| SurfaceError::ConfigWrite(e.to_string()))?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: self.created_at.clone().unwrap_or_else(|| now.clone()),
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| SurfaceError::ConfigSerialize(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| SurfaceError::ConfigWrite(e.to_string()))?;

        self.created_at = Some(config_file.created_at);
        Ok(())
    }

    /// Validate, update and save settings
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), SurfaceError> {
        Self::validate_settings(&settings).map_err(SurfaceError::ConfigValidation)?;
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration schema with available options
    pub fn schema() -> ConfigSchema {
        let defaults = Settings::default();

        ConfigSchema {
            midi_device: ConfigOption {
                default: defaults.midi_device,
                valid_range: None,
                description: "Substring of the surface's MIDI port name".to_string(),
                requires_restart: true,
            },
            client_name: ConfigOption {
                default: defaults.client_name,
                valid_range: None,
                description: "MIDI client name".to_string(),
                requires_restart: true,
            },
            long_press_timeout_secs: ConfigOption {
                default: defaults.long_press_timeout_secs,
                valid_range: Some((0.0, 10.0)),
                description: "Seconds a press must be held to count as a long press".to_string(),
                requires_restart: false,
            },
            turn_warning_threshold: ConfigOption {
                default: defaults.turn_warning_threshold,
                valid_range: Some((1, 63)),
                description: "Turn magnitude above which a warning is logged".to_string(),
                requires_restart: false,
            },
            refresh_leds_on_start: ConfigOption {
                default: defaults.refresh_leds_on_start,
                valid_range: None,
                description: "Re-send cached LED values after connecting".to_string(),
                requires_restart: false,
            },
        }
    }

    /// Validate settings against schema
    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let schema = Self::schema();

        if settings.midi_device.trim().is_empty() {
            errors.push("midi_device must not be empty".to_string());
        }

        if let Some((min, max)) = schema.long_press_timeout_secs.valid_range {
            let timeout = settings.long_press_timeout_secs;
            if !(min..=max).contains(&timeout) {
                errors.push(format!(
                    "long_press_timeout_secs must be between {} and {}",
                    min, max
                ));
            }
        }

        if let Some((min, max)) = schema.turn_warning_threshold.valid_range {
            if !(min..=max).contains(&settings.turn_warning_threshold) {
                errors.push(format!(
                    "turn_warning_threshold must be between {} and {}",
                    min, max
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_config_manager_new() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let manager = ConfigManager::new(Some(config_path.clone()));
        assert_eq!(manager.config_path(), config_path);
        assert_eq!(manager.settings(), &Settings::default());
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        let settings = manager.load().unwrap();

        assert_eq!(settings, Settings::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));

        let settings = Settings {
            midi_device: "Test Surface".to_string(),
            long_press_timeout_secs: 0.8,
            ..Settings::default()
        };
        manager.update_settings(settings).unwrap();

        let mut manager2 = ConfigManager::new(Some(config_path));
        let loaded = manager2.load().unwrap();

        assert_eq!(loaded.midi_device, "Test Surface");
        assert_eq!(loaded.long_press_timeout_secs, 0.8);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"version":"0.0.1","settings":{"long_press_timeout_secs":1.5},"created_at":"","modified_at":""}"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.long_press_timeout_secs, 1.5);
        assert_eq!(loaded.midi_device, Settings::default().midi_device);
    }

    #[test]
    fn test_update_keeps_creation_time() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let created = "2024-03-01T12:00:00+00:00";
        fs::write(
            &config_path,
            format!(
                r#"{{"version":"0.0.1","settings":{{}},"created_at":"{}","modified_at":"{}"}}"#,
                created, created
            ),
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        manager.load().unwrap();
        manager
            .update_settings(Settings {
                long_press_timeout_secs: 0.4,
                ..Settings::default()
            })
            .unwrap();

        let written: ConfigFile =
            serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
        assert_eq!(written.created_at, created);
        assert_ne!(written.modified_at, created);
        assert_eq!(written.settings.long_press_timeout_secs, 0.4);
    }

    #[test]
    fn test_fresh_file_keeps_first_creation_time() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut manager = ConfigManager::new(Some(config_path.clone()));
        manager.load().unwrap();
        let first: ConfigFile =
            serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();

        manager.update_settings(Settings::default()).unwrap();
        let second: ConfigFile =
            serde_json::from_str(&fs::read_to_string(&config_path).unwrap()).unwrap();

        assert_eq!(second.created_at, first.created_at);
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(ConfigManager::validate_settings(&settings).is_ok());

        settings.long_press_timeout_secs = -0.5;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.long_press_timeout_secs = 0.5;
        settings.turn_warning_threshold = 0;
        assert!(ConfigManager::validate_settings(&settings).is_err());

        settings.turn_warning_threshold = 10;
        settings.midi_device = "  ".to_string();
        assert_eq!(ConfigManager::validate_settings(&settings).unwrap_err().len(), 1);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "not json").unwrap();

        let mut manager = ConfigManager::new(Some(config_path));
        assert!(matches!(manager.load(), Err(SurfaceError::ConfigParse(_))));
    }
}
