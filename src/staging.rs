//! Instruction and camera preview screens shown before the capture loop.
//!
//! Both screens are decoration; what matters to the session is the signal
//! that ends them: Space moves on, Escape aborts.

use anyhow::Result;
use image::imageops::{self, FilterType};
use log::{info, warn};

use crate::devices::{FrameSink, FrameSource, UserSignal};
use crate::font;
use crate::types::Frame;

const WHITE: (u8, u8, u8) = (255, 255, 255);

const INSTRUCTIONS: [&str; 10] = [
    "We are going to collect data to map your eye gaze to screen positions.",
    "1. Sit comfortably, keep your head as steady as you reasonably can.",
    "2. For each dot, move your eyes to the dot and then hold your gaze.",
    "3. Try not to move your head too much while the dot is on the screen.",
    "",
    "After you press SPACE, the system may ask for CAMERA PERMISSION.",
    "Please allow it so we can record your face.",
    "",
    "Press SPACE to open the camera and start setup.",
    "Press ESC at any time to quit.",
];

const PREVIEW_LINES: [&str; 3] = [
    "Camera preview - adjust your position & lighting",
    "Look at the screen, not the camera.",
    "Press SPACE to start calibration, ESC to quit.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Cancelled,
}

fn text_scale(width: usize) -> usize {
    (width / 360).clamp(1, 6)
}

pub fn instruction_screen(width: usize, height: usize) -> Vec<u8> {
    let mut buf = vec![0u8; width * height * 3];
    let scale = text_scale(width);
    let line_gap = 12 * scale;

    let mut y = height / 6;
    font::draw_centered_text(&mut buf, width, height, y, "Gaze Calibration", WHITE, scale * 2);
    y += line_gap * 3;

    for line in INSTRUCTIONS {
        font::draw_centered_text(&mut buf, width, height, y, line, WHITE, scale);
        y += line_gap;
    }

    let footer_y = height.saturating_sub(line_gap * 3);
    let footer = "[ PRESS SPACE TO CONTINUE ]";
    font::draw_centered_text(&mut buf, width, height, footer_y, footer, WHITE, scale);
    buf
}

/// Camera frame scaled to the screen with a darkened instruction band on top.
pub fn preview_screen(frame: &Frame, width: usize, height: usize, mirror: bool) -> Vec<u8> {
    let mut scaled = imageops::resize(frame, width as u32, height as u32, FilterType::Triangle);
    if mirror {
        imageops::flip_horizontal_in_place(&mut scaled);
    }
    let mut buf = scaled.into_raw();

    let scale = text_scale(width);
    let line_gap = 12 * scale;
    let band = (line_gap * (PREVIEW_LINES.len() + 1)).min(height);

    // 70% black over the band
    for v in &mut buf[..band * width * 3] {
        *v = (*v as u16 * 3 / 10) as u8;
    }

    let mut y = line_gap / 2;
    for line in PREVIEW_LINES {
        font::draw_centered_text(&mut buf, width, height, y, line, WHITE, scale);
        y += line_gap;
    }
    buf
}

fn waiting_screen(width: usize, height: usize) -> Vec<u8> {
    let mut buf = vec![0u8; width * height * 3];
    let scale = text_scale(width);
    let text = "Waiting for camera...";
    font::draw_centered_text(&mut buf, width, height, height / 2, text, WHITE, scale);
    buf
}

fn outcome(signal: Option<UserSignal>) -> Option<StageOutcome> {
    match signal {
        Some(UserSignal::Continue) => Some(StageOutcome::Continue),
        Some(UserSignal::Cancel) => Some(StageOutcome::Cancelled),
        None => None,
    }
}

pub fn run_instruction_stage(sink: &mut dyn FrameSink) -> Result<StageOutcome> {
    let screen = instruction_screen(sink.width(), sink.height());
    loop {
        sink.present(&screen)?;
        if let Some(o) = outcome(sink.poll_signal()) {
            if o == StageOutcome::Cancelled {
                info!("User cancelled at instruction screen.");
            }
            return Ok(o);
        }
    }
}

pub fn run_preview_stage(
    sink: &mut dyn FrameSink,
    source: &mut dyn FrameSource,
    mirror: bool,
) -> Result<StageOutcome> {
    let (width, height) = (sink.width(), sink.height());
    let mut screen = waiting_screen(width, height);
    info!("Camera opened. Showing preview...");

    loop {
        match source.capture() {
            Ok(frame) => screen = preview_screen(&frame, width, height, mirror),
            Err(e) => warn!("Failed to read frame in preview: {:#}", e),
        }
        // Present even without a new frame so input keeps flowing
        sink.present(&screen)?;
        if let Some(o) = outcome(sink.poll_signal()) {
            if o == StageOutcome::Cancelled {
                info!("User cancelled at preview stage.");
            }
            return Ok(o);
        }
    }
}
