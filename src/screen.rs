/// Supplies the geometry of the display the targets are drawn on.
pub trait ScreenInfoProvider {
    fn screen_size(&self) -> (u32, u32);
}

/// Screen geometry taken from configuration.
///
/// minifb has no way to query the desktop resolution, so the size is
/// configured (defaults to a 1440x900 panel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedScreen {
    pub width: u32,
    pub height: u32,
}

impl FixedScreen {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ScreenInfoProvider for FixedScreen {
    fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
