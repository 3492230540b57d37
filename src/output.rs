use anyhow::Result;
use minifb::{Key, KeyRepeat};

use crate::devices::{FrameSink, UserSignal};
use crate::error::CaptureError;

/// Borderless minifb window covering the configured screen.
pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, CaptureError> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                borderless: true,
                topmost: true,
                ..minifb::WindowOptions::default()
            },
        ).map_err(|e| CaptureError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_micros(16600))); // ~60 FPS

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }
}

impl FrameSink for WindowOutput {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn present(&mut self, rgb: &[u8]) -> Result<()> {
        // buffer is RGB8, need to convert to u32 0RGB
        for (dst, chunk) in self.buffer.iter_mut().zip(rgb.chunks_exact(3)) {
            let r = chunk[0] as u32;
            let g = chunk[1] as u32;
            let b = chunk[2] as u32;
            *dst = (r << 16) | (g << 8) | b;
        }

        // Blocks until the next refresh slot; this is where wall-clock time passes
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| CaptureError::Window(e.to_string()).into())
    }

    fn poll_signal(&mut self) -> Option<UserSignal> {
        if !self.is_open() {
            return Some(UserSignal::Cancel);
        }
        let keys = self.window.get_keys_pressed(KeyRepeat::No);
        if keys.contains(&Key::Escape) {
            Some(UserSignal::Cancel)
        } else if keys.contains(&Key::Space) {
            Some(UserSignal::Continue)
        } else {
            None
        }
    }
}
