use thiserror::Error;

/// Conditions that end a session before or during acquisition.
///
/// Per-frame read failures are not represented here: they are logged and
/// skipped by the capture loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open camera {index}: {reason}")]
    CameraOpen { index: u32, reason: String },

    #[error("camera delivered no frame for {consecutive} consecutive reads")]
    CameraStalled { consecutive: u32 },

    #[error("display window failure: {0}")]
    Window(String),
}
