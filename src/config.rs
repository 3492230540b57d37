use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use log::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stimulus: StimulusConfig,
    pub timing: TimingConfig,
    pub grid: GridConfig,
    pub camera: CameraConfig,
    pub screen: ScreenConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusConfig {
    pub base_radius: f64,  // px
    pub amplitude: f64,    // px, peak-to-peak
    pub pulse_freq: f64,   // pulses per second
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub move_duration: f64,    // seconds
    pub capture_duration: f64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
    pub margin_ratio: f64,
    /// Fixed shuffle seed. `None` draws one from the OS.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub mirror_preview: bool,
    /// Escalate to a fatal error after this many failed reads in a row.
    pub max_consecutive_failures: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
    pub image_ext: String, // "jpg" or "png"
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            base_radius: 15.0,
            amplitude: 10.0,
            pulse_freq: 1.5,
            show_progress: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            move_duration: 1.0,
            capture_duration: 1.5,
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: 5,
            rows: 3,
            margin_ratio: 0.12,
            seed: None,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            mirror_preview: true,
            max_consecutive_failures: None,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1440,
            height: 900,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            image_ext: "jpg".to_string(),
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "config.json";

    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            // #[serde(default)] fills in anything the file leaves out
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    warn!("Error parsing config: {}. Loading defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        // Always save back to ensure new fields are populated in the file
        config.save(path)?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.grid.cols, 5);
        assert_eq!(config.grid.rows, 3);
        assert_eq!(config.timing.move_duration, 1.0);
        assert_eq!(config.timing.capture_duration, 1.5);
        assert_eq!(config.stimulus.pulse_freq, 1.5);
        assert!(path.exists(), "defaults should be written back");
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "grid": { "cols": 7 }, "camera": { "index": 2 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.grid.cols, 7);
        assert_eq!(config.grid.rows, 3);
        assert_eq!(config.camera.index, 2);
        assert!(config.camera.max_consecutive_failures.is_none());

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("\"capture_duration\""));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json at all").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.screen.width, 1440);
        assert_eq!(config.output.image_ext, "jpg");
    }
}
