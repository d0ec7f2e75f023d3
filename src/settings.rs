//! Persisted application state: last directories, export settings, window geometry.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ExportSettings;
use crate::error::AnimResult;

const APP_DIR: &str = "animpal";
const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_WINDOW: WindowGeometry = WindowGeometry {
    x: 100.0,
    y: 100.0,
    width: 1600.0,
    height: 900.0,
};

pub const MIN_WINDOW_SIZE: [f32; 2] = [1024.0, 720.0];

/// Outer window position and inner size, in logical points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl WindowGeometry {
    /// Geometry that is on screen and at least the minimum size.
    pub fn is_usable(&self) -> bool {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width >= MIN_WINDOW_SIZE[0]
            && self.height >= MIN_WINDOW_SIZE[1]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub last_image_dir: Option<PathBuf>,
    pub last_video_dir: Option<PathBuf>,
    pub export: ExportSettings,
    pub window: Option<WindowGeometry>,
}

impl AppSettings {
    /// Standard location of the settings file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(SETTINGS_FILE)
    }

    /// Load from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings at {:?}, using defaults", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Failed to parse settings at {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> AnimResult<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> AnimResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Record the window geometry seen when the app closes. Unusable geometry
    /// (minimised, off-screen) keeps whatever was stored before.
    pub fn remember_window(&mut self, geometry: Option<WindowGeometry>) {
        if let Some(geometry) = geometry.filter(WindowGeometry::is_usable) {
            self.window = Some(geometry);
        }
    }

    /// Saved geometry if it can be restored, otherwise the default window.
    pub fn window_or_default(&self) -> WindowGeometry {
        self.window
            .filter(WindowGeometry::is_usable)
            .unwrap_or(DEFAULT_WINDOW)
    }

    /// Directory to open the image picker in.
    pub fn image_dir(&self) -> PathBuf {
        self.last_image_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default()
    }

    /// Directory to open the save dialog in.
    pub fn video_dir(&self) -> PathBuf {
        self.last_video_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Direction, FrameHold, FrameRate, Resolution};

    fn settings_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("animpal_settings_{}_{}", name, std::process::id()))
            .join(SETTINGS_FILE)
    }

    #[test]
    fn test_settings_round_trip() {
        let path = settings_path("roundtrip");
        let settings = AppSettings {
            last_image_dir: Some(PathBuf::from("/shots")),
            last_video_dir: None,
            export: ExportSettings {
                resolution: Resolution::Uhd4k,
                fps: FrameRate::Fps30,
                direction: Direction::Reverse,
                frame_hold: FrameHold::new(2).unwrap(),
            },
            window: Some(WindowGeometry {
                x: 10.0,
                y: 20.0,
                width: 1400.0,
                height: 800.0,
            }),
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = settings_path("missing");
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let path = settings_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let path = settings_path("partial");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"last_video_dir":"/renders"}"#).unwrap();
        let settings = AppSettings::load_from(&path);
        assert_eq!(settings.last_video_dir, Some(PathBuf::from("/renders")));
        assert_eq!(settings.export, ExportSettings::default());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_remember_window_keeps_last_usable_geometry() {
        let placed = WindowGeometry {
            x: 40.0,
            y: 60.0,
            width: 1280.0,
            height: 800.0,
        };
        let mut settings = AppSettings::default();
        settings.remember_window(Some(placed));
        assert_eq!(settings.window, Some(placed));

        settings.remember_window(Some(WindowGeometry {
            x: -32000.0,
            y: -32000.0,
            width: 160.0,
            height: 28.0,
        }));
        settings.remember_window(None);
        assert_eq!(settings.window, Some(placed));
        assert_eq!(settings.window_or_default(), placed);
    }

    #[test]
    fn test_offscreen_window_falls_back() {
        let settings = AppSettings {
            window: Some(WindowGeometry {
                x: -3000.0,
                y: 0.0,
                width: 1600.0,
                height: 900.0,
            }),
            ..Default::default()
        };
        assert_eq!(settings.window_or_default(), DEFAULT_WINDOW);
    }
}
