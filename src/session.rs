use anyhow::{ensure, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::phase::PhaseClock;
use crate::screen::ScreenInfoProvider;

pub const IMAGES_DIR: &str = "images";
pub const LABELS_FILE: &str = "labels.csv";

/// Everything fixed for the lifetime of one session, computed once at startup.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub session_id: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub out_dir: PathBuf,
    pub image_ext: String,
    pub phase_clock: PhaseClock,
    pub show_progress: bool,
    pub max_consecutive_failures: Option<u32>,
}

impl SessionConfig {
    pub fn new(
        config: &AppConfig,
        screen: &dyn ScreenInfoProvider,
        started: DateTime<Local>,
    ) -> Result<Self> {
        let (screen_width, screen_height) = screen.screen_size();
        ensure!(
            screen_width > 0 && screen_height > 0,
            "screen size must be non-zero, got {}x{}",
            screen_width,
            screen_height
        );

        let timing = &config.timing;
        ensure!(
            timing.move_duration.is_finite() && timing.capture_duration.is_finite(),
            "phase durations must be finite"
        );
        ensure!(
            timing.move_duration >= 0.0 && timing.capture_duration > 0.0,
            "move duration must be >= 0 and capture duration > 0"
        );

        let stimulus = &config.stimulus;
        for (name, value) in [
            ("base_radius", stimulus.base_radius),
            ("amplitude", stimulus.amplitude),
            ("pulse_freq", stimulus.pulse_freq),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "stimulus {} must be a finite non-negative number, got {}",
                name,
                value
            );
        }

        let writable = image::ImageFormat::from_extension(&config.output.image_ext)
            .is_some_and(|format| format.writing_enabled());
        ensure!(
            writable,
            "unsupported image extension '{}'",
            config.output.image_ext
        );

        let session_id = started.format("%Y%m%d_%H%M%S").to_string();
        let out_dir = config.output.data_dir.join(format!("gaze_data_{}", session_id));

        Ok(Self {
            session_id,
            screen_width,
            screen_height,
            out_dir,
            image_ext: config.output.image_ext.clone(),
            phase_clock: PhaseClock::new(&config.timing, &config.stimulus),
            show_progress: config.stimulus.show_progress,
            max_consecutive_failures: config.camera.max_consecutive_failures,
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn images_dir(&self) -> PathBuf {
        self.out_dir.join(IMAGES_DIR)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.out_dir.join(LABELS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::FixedScreen;
    use chrono::TimeZone;

    #[test]
    fn test_layout_and_identifier() {
        let mut config = AppConfig::default();
        config.output.data_dir = PathBuf::from("/tmp/gaze");
        let started = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();

        let session = SessionConfig::new(&config, &FixedScreen::new(1920, 1080), started).unwrap();
        assert_eq!(session.session_id, "20260304_050607");
        assert_eq!(session.out_dir(), Path::new("/tmp/gaze/gaze_data_20260304_050607"));
        let out = Path::new("/tmp/gaze/gaze_data_20260304_050607");
        assert_eq!(session.images_dir(), out.join("images"));
        assert_eq!(session.labels_path(), out.join("labels.csv"));
        assert_eq!((session.screen_width, session.screen_height), (1920, 1080));
        assert_eq!(session.phase_clock.window(), 2.5);
    }

    #[test]
    fn test_rejects_unknown_image_extension() {
        let mut config = AppConfig::default();
        config.output.image_ext = "xyz".to_string();
        let err = SessionConfig::new(&config, &FixedScreen::new(800, 600), Local::now());
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_empty_screen() {
        let config = AppConfig::default();
        assert!(SessionConfig::new(&config, &FixedScreen::new(0, 600), Local::now()).is_err());
    }

    #[test]
    fn test_rejects_read_only_image_format() {
        let mut config = AppConfig::default();
        config.output.image_ext = "dds".to_string();
        assert!(SessionConfig::new(&config, &FixedScreen::new(800, 600), Local::now()).is_err());
    }

    #[test]
    fn test_rejects_bad_stimulus_parameters() {
        let screen = FixedScreen::new(800, 600);
        let cases: [fn(&mut AppConfig); 5] = [
            |c| c.stimulus.amplitude = -10.0,
            |c| c.stimulus.base_radius = f64::NAN,
            |c| c.stimulus.pulse_freq = f64::INFINITY,
            |c| c.timing.capture_duration = f64::INFINITY,
            |c| c.timing.move_duration = f64::NAN,
        ];
        for tweak in cases {
            let mut config = AppConfig::default();
            tweak(&mut config);
            assert!(SessionConfig::new(&config, &screen, Local::now()).is_err());
        }
    }
}
