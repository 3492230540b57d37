use crate::font;
use crate::types::{CalibrationPoint, PhaseState};

pub const MOVE_COLOR: (u8, u8, u8) = (255, 165, 0); // amber
pub const CAPTURE_COLOR: (u8, u8, u8) = (255, 0, 0); // red
const TEXT_COLOR: (u8, u8, u8) = (160, 160, 160);

pub fn phase_color(phase: PhaseState) -> (u8, u8, u8) {
    match phase {
        PhaseState::Move => MOVE_COLOR,
        PhaseState::Capture | PhaseState::Done => CAPTURE_COLOR,
    }
}

/// Fill a circle into an RGB8 buffer, clipped to the buffer.
pub fn fill_circle(
    buffer: &mut [u8],
    width: usize,
    height: usize,
    cx: i32,
    cy: i32,
    radius: i32,
    color: (u8, u8, u8),
) {
    if radius < 0 || width == 0 || height == 0 {
        return;
    }
    // i64 so that a very large radius cannot overflow the squared distance
    let (cx, cy, radius) = (cx as i64, cy as i64, radius as i64);
    let r2 = radius * radius;
    let y0 = (cy - radius).max(0);
    let y1 = (cy + radius).min(height as i64 - 1);
    let x0 = (cx - radius).max(0);
    let x1 = (cx + radius).min(width as i64 - 1);

    for py in y0..=y1 {
        let dy = py - cy;
        for px in x0..=x1 {
            let dx = px - cx;
            if dx * dx + dy * dy <= r2 {
                let idx = (py as usize * width + px as usize) * 3;
                buffer[idx] = color.0;
                buffer[idx + 1] = color.1;
                buffer[idx + 2] = color.2;
            }
        }
    }
}

/// Draws the full-screen stimulus: black background and one pulsing dot.
pub struct StimulusRenderer {
    width: usize,
    height: usize,
    buffer: Vec<u8>,
    show_progress: bool,
}

impl StimulusRenderer {
    pub fn new(width: usize, height: usize, show_progress: bool) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width * height * 3],
            show_progress,
        }
    }

    pub fn render(&mut self, point: CalibrationPoint, phase: PhaseState, radius: f64) -> &[u8] {
        self.buffer.fill(0);
        // Whole pixels, truncated
        fill_circle(
            &mut self.buffer,
            self.width,
            self.height,
            point.x,
            point.y,
            radius as i32,
            phase_color(phase),
        );
        &self.buffer
    }

    /// Same as `render`, plus the optional point counter and hint line.
    pub fn render_with_progress(
        &mut self,
        point: CalibrationPoint,
        phase: PhaseState,
        radius: f64,
        index: usize,
        total: usize,
    ) -> &[u8] {
        self.render(point, phase, radius);
        if self.show_progress {
            let (w, h, scale) = (self.width, self.height, 4);
            let counter = format!("POINT {}/{}", index + 1, total);
            font::draw_centered_text(&mut self.buffer, w, h, 60, &counter, TEXT_COLOR, scale);
            let hint = match phase {
                PhaseState::Move => "MOVE YOUR EYES TO THE DOT",
                _ => "HOLD YOUR GAZE ON THE DOT",
            };
            font::draw_centered_text(&mut self.buffer, w, h, 100, hint, TEXT_COLOR, scale);
        }
        &self.buffer
    }
}
