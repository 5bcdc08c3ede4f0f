use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const DEFAULT_THEME: &str = "default";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_WIDTH: f64 = 1358.0;
pub const DEFAULT_HEIGHT: f64 = 871.0;
pub const MIN_WIDTH: f64 = 700.0;
pub const MIN_HEIGHT: f64 = 437.0;

pub const DEFAULT_VOLUME: f64 = 1.0;
pub const MIN_VOLUME: f64 = 0.5;
pub const MAX_VOLUME: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WindowSize {
    /// Raises either dimension to the window minimum. Non-finite values fall back to the default.
    pub fn clamped(self) -> Self {
        let fix = |value: f64, default: f64, min: f64| {
            if value.is_finite() {
                value.max(min)
            } else {
                default
            }
        };
        Self {
            width: fix(self.width, DEFAULT_WIDTH, MIN_WIDTH),
            height: fix(self.height, DEFAULT_HEIGHT, MIN_HEIGHT),
        }
    }
}

fn default_width() -> f64 {
    DEFAULT_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_HEIGHT
}

pub fn clamp_volume(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_VOLUME, MAX_VOLUME)
    } else {
        DEFAULT_VOLUME
    }
}

// On-disk shape. Every field is optional so partially written files still load.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    theme: Option<String>,
    window_size: Option<WindowSize>,
    volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: String,
    pub window_size: WindowSize,
    pub volume: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            window_size: WindowSize::default(),
            volume: DEFAULT_VOLUME,
        }
    }
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let mut settings = Settings::default();
        settings.set_theme(raw.theme.as_deref().unwrap_or(DEFAULT_THEME));
        settings.set_window_size(raw.window_size.unwrap_or_default());
        settings.set_volume(raw.volume.unwrap_or(DEFAULT_VOLUME));
        settings
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSettings = serde_json::from_str(json)?;
        Ok(raw.into())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads the settings file, writing defaults first when it doesn't exist.
    ///
    /// A file that exists but can't be parsed is left untouched and defaults are
    /// returned; it gets replaced on the next save.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("DUEL-SETTINGS: No settings at {}, writing defaults", path.display());
            let settings = Settings::default();
            settings.save(path)?;
            return Ok(settings);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        match Settings::from_json(&contents) {
            Ok(settings) => {
                log::info!(
                    "DUEL-SETTINGS: Loaded theme={} size={}x{} volume={}",
                    settings.theme,
                    settings.window_size.width,
                    settings.window_size.height,
                    settings.volume
                );
                Ok(settings)
            }
            Err(e) => {
                log::warn!(
                    "DUEL-SETTINGS: Ignoring unreadable settings at {}: {}",
                    path.display(),
                    e
                );
                Ok(Settings::default())
            }
        }
    }

    /// Writes to a temp file next to `path` and renames it over, so a crash
    /// mid-write leaves the previous file intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let json = self.to_json()?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| Error::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
        log::debug!("DUEL-SETTINGS: Saved to {}", path.display());
        Ok(())
    }

    pub fn set_theme(&mut self, theme: &str) {
        let theme = theme.trim();
        self.theme = if theme.is_empty() {
            DEFAULT_THEME.to_string()
        } else {
            theme.to_string()
        };
    }

    pub fn set_window_size(&mut self, size: WindowSize) {
        self.window_size = size.clamped();
    }

    pub fn set_volume(&mut self, volume: f64) -> f64 {
        self.volume = clamp_volume(volume);
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);

        let settings = Settings::load_or_init(&path).unwrap();

        assert_eq!(settings, Settings::default());
        assert!(path.exists());
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["theme"], "default");
        assert_eq!(written["windowSize"]["width"], 1358.0);
        assert_eq!(written["windowSize"]["height"], 871.0);
    }

    #[test]
    fn test_theme_only_file_uses_default_size() {
        let settings = Settings::from_json(r#"{ "theme": "midnight" }"#).unwrap();
        assert_eq!(settings.theme, "midnight");
        assert_eq!(settings.window_size, WindowSize::default());
        assert_eq!(settings.volume, DEFAULT_VOLUME);
    }

    #[test]
    fn test_blank_or_null_theme_is_default() {
        assert_eq!(Settings::from_json(r#"{ "theme": "" }"#).unwrap().theme, "default");
        assert_eq!(Settings::from_json(r#"{ "theme": null }"#).unwrap().theme, "default");
        assert_eq!(Settings::from_json("{}").unwrap().theme, "default");
    }

    #[test]
    fn test_partial_window_size() {
        let settings = Settings::from_json(r#"{ "windowSize": { "width": 1000 } }"#).unwrap();
        assert_eq!(settings.window_size.width, 1000.0);
        assert_eq!(settings.window_size.height, DEFAULT_HEIGHT);
    }

    #[test]
    fn test_window_size_is_raised_to_minimum() {
        let settings =
            Settings::from_json(r#"{ "windowSize": { "width": 200, "height": 100 } }"#).unwrap();
        assert_eq!(settings.window_size.width, MIN_WIDTH);
        assert_eq!(settings.window_size.height, MIN_HEIGHT);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut settings = Settings::default();
        assert_eq!(settings.set_volume(10.0), MAX_VOLUME);
        assert_eq!(settings.set_volume(0.0), MIN_VOLUME);
        assert_eq!(settings.set_volume(f64::NAN), DEFAULT_VOLUME);
        assert_eq!(settings.set_volume(1.7), 1.7);
    }

    #[test]
    fn test_unreadable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let settings = Settings::load_or_init(&path).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_null_volume_uses_default() {
        let settings = Settings::from_json(r#"{ "theme": "midnight", "volume": null }"#).unwrap();
        assert_eq!(settings.volume, DEFAULT_VOLUME);
        assert_eq!(settings.theme, "midnight");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let settings =
            Settings::from_json(r#"{ "theme": "parchment", "zoom": 2, "extra": [1, 2] }"#).unwrap();
        assert_eq!(settings.theme, "parchment");
    }

    #[test]
    fn test_save_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "theme": "old" }"#).unwrap();

        let mut settings = Settings::default();
        settings.set_theme("midnight");
        settings.set_volume(2.5);
        settings.save(&path).unwrap();

        let reloaded = Settings::load_or_init(&path).unwrap();
        assert_eq!(reloaded, settings);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(SETTINGS_FILE_NAME)]);
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the final rename fail.
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        assert!(matches!(Settings::default().save(&path), Err(Error::Io { .. })));
        assert_eq!(std::fs::read_to_string(path.join("keep")).unwrap(), "x");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_saved_json_is_pretty_camel_case() {
        let json = Settings::default().to_json().unwrap();
        assert!(json.contains("\n  \"windowSize\": {"));
        assert!(!json.contains("window_size"));
    }
}
