use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "WIDGETOPIA_SETTINGS";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file receiving a copy of the log output.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Directory holding `storage.json`. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<String>,
    /// weatherapi.com key. Falls back to `WEATHER_API_KEY`.
    #[serde(default)]
    pub weather_api_key: Option<String>,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: u8,
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    #[serde(default = "default_grid_margin")]
    pub grid_margin: f32,
    /// Last known window size. If absent, a default size is used.
    #[serde(default)]
    pub window_size: Option<(f32, f32)>,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
}

fn default_grid_columns() -> u8 {
    12
}

fn default_row_height() -> f32 {
    50.0
}

fn default_grid_margin() -> f32 {
    10.0
}

fn default_toast_duration() -> f32 {
    3.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            data_dir: None,
            weather_api_key: None,
            grid_columns: default_grid_columns(),
            row_height: default_row_height(),
            grid_margin: default_grid_margin(),
            window_size: None,
            toast_duration: default_toast_duration(),
        }
    }
}

impl Settings {
    /// Settings file path, honouring `WIDGETOPIA_SETTINGS`.
    pub fn path() -> String {
        std::env::var(SETTINGS_ENV).unwrap_or_else(|_| SETTINGS_FILE.to_string())
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = self.data_dir.as_deref().filter(|d| !d.trim().is_empty()) {
            return PathBuf::from(dir);
        }
        dirs_next::data_dir()
            .map(|d| d.join("widgetopia"))
            .unwrap_or_else(|| PathBuf::from("widgetopia-data"))
    }

    pub fn weather_api_key(&self) -> Option<String> {
        self.weather_api_key
            .clone()
            .or_else(|| std::env::var("WEATHER_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn grid_columns(&self) -> i32 {
        i32::from(self.grid_columns.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.grid_columns(), 12);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"debug_logging":true,"row_height":40}"#).unwrap();
        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert!(settings.debug_logging);
        assert_eq!(settings.row_height, 40.0);
        assert_eq!(settings.grid_margin, 10.0);
        assert_eq!(settings.toast_duration, 3.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{").unwrap();
        assert!(Settings::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    #[serial]
    fn api_key_falls_back_to_environment() {
        std::env::set_var("WEATHER_API_KEY", "from-env");
        let mut settings = Settings::default();
        assert_eq!(settings.weather_api_key().as_deref(), Some("from-env"));
        settings.weather_api_key = Some("from-file".into());
        assert_eq!(settings.weather_api_key().as_deref(), Some("from-file"));
        std::env::remove_var("WEATHER_API_KEY");
        settings.weather_api_key = Some("  ".into());
        assert_eq!(settings.weather_api_key(), None);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let settings = Settings {
            data_dir: Some("/tmp/wd".into()),
            ..Settings::default()
        };
        assert_eq!(settings.data_dir(), PathBuf::from("/tmp/wd"));
    }
}
