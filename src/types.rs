use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A camera frame as delivered by the capture backend.
pub type Frame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Represents a single on-screen target in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalibrationPoint {
    pub x: i32,
    pub y: i32,
}

impl CalibrationPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Where a target's window currently is. Always derived from elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    Move,
    Capture,
    Done,
}

impl PhaseState {
    pub fn label(&self) -> &'static str {
        match self {
            PhaseState::Move => "move",
            PhaseState::Capture => "capture",
            PhaseState::Done => "done",
        }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of `labels.csv`. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub filename: String,
    #[serde(rename = "tx")]
    pub target_x: i32,
    #[serde(rename = "ty")]
    pub target_y: i32,
    pub x_norm: f64,
    pub y_norm: f64,
    pub timestamp: f64,
    pub phase: PhaseState,
}
