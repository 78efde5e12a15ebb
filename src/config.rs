use crate::settings::{FieldSettings, Theme};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "architectural-grid";
const THEME_FILE: &str = "theme.json";

/// Braille dot scale bounds (logical pixels per dot)
pub const MIN_PIXELS_PER_DOT: u32 = 1;
pub const MAX_PIXELS_PER_DOT: u32 = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Particle field tunables
    pub settings: FieldSettings,
    pub theme: Theme,
    /// Logical pixels per braille dot
    pub pixels_per_dot: u32,
    /// Fixed RNG seed, random when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| ConfigError::io(path, e))
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.pixels_per_dot = config.pixels_per_dot.clamp(MIN_PIXELS_PER_DOT, MAX_PIXELS_PER_DOT);
        config.settings = config.settings.sanitized();
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: FieldSettings::default(),
            theme: Theme::default(),
            pixels_per_dot: 4,
            seed: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemePreference {
    theme: Theme,
}

/// Where the theme preference lives on this platform
pub fn theme_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR).join(THEME_FILE))
}

/// Read a saved theme. Missing or unreadable files yield `None`.
pub fn load_theme(path: &Path) -> Option<Theme> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ThemePreference>(&content) {
        Ok(pref) => Some(pref.theme),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt theme preference");
            None
        }
    }
}

/// Persist the theme, creating parent directories as needed
pub fn save_theme(path: &Path, theme: Theme) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;
    }
    let json = serde_json::to_string_pretty(&ThemePreference { theme })?;
    fs::write(path, json).map_err(|e| ConfigError::io(path, e))
}

/// Persist the theme at the platform location
pub fn save_theme_preference(theme: Theme) -> Result<(), ConfigError> {
    let path = theme_path().ok_or(ConfigError::NoConfigDir)?;
    save_theme(&path, theme)
}

/// Saved theme at the platform location, if any
pub fn load_theme_preference() -> Option<Theme> {
    theme_path().and_then(|path| load_theme(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_config_file_save_and_load() {
        let config = AppConfig {
            version: 1,
            settings: FieldSettings {
                particle_count: 250,
                capture_radius: 120.0,
                attraction: 0.0002,
                connection_distance: 80.0,
                max_age: 300,
                grid_spacing: 40.0,
            },
            theme: Theme::Matrix,
            pixels_per_dot: 2,
            seed: Some(1234),
        };

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();
        let loaded = AppConfig::load_from_file(temp_file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_theme_serialized_lowercase() {
        let json = serde_json::to_string(&AppConfig::default()).unwrap();
        assert!(json.contains("\"theme\":\"dark\""));
    }

    #[test]
    fn test_missing_seed_defaults_to_none() {
        let json = r#"{
            "version": 1,
            "settings": {
                "particle_count": 100,
                "capture_radius": 150.0,
                "attraction": 0.0001,
                "connection_distance": 100.0,
                "max_age": 200,
                "grid_spacing": 50.0
            },
            "theme": "light",
            "pixels_per_dot": 40
        }"#;
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), json).unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.theme, Theme::Light);
        // Out-of-range scale is clamped on load
        assert_eq!(config.pixels_per_dot, MAX_PIXELS_PER_DOT);
    }

    #[test]
    fn test_out_of_range_settings_clamped_on_load() {
        let json = r#"{
            "version": 1,
            "settings": {
                "particle_count": 200000,
                "capture_radius": 150.0,
                "attraction": 0.0001,
                "connection_distance": 100.0,
                "max_age": 200,
                "grid_spacing": 0.00000001
            },
            "theme": "dark",
            "pixels_per_dot": 4
        }"#;
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), json).unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.settings.particle_count, crate::settings::MAX_PARTICLES);
        assert_eq!(config.settings.grid_spacing, crate::settings::MIN_GRID_SPACING);
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = AppConfig::load_from_file(temp_file.path());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_theme_preference_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(THEME_FILE);

        assert_eq!(load_theme(&path), None);
        save_theme(&path, Theme::Matrix).unwrap();
        assert_eq!(load_theme(&path), Some(Theme::Matrix));
        save_theme(&path, Theme::Light).unwrap();
        assert_eq!(load_theme(&path), Some(Theme::Light));
    }

    #[test]
    fn test_corrupt_theme_preference_ignored() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "{\"theme\": \"sepia\"}").unwrap();
        assert_eq!(load_theme(temp_file.path()), None);
    }
}
