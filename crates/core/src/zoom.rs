pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 5;

/// Integer zoom level in `MIN_ZOOM..=MAX_ZOOM`; the render scale equals the
/// level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    /// Clamps `level` into range.
    pub fn new(level: i32) -> Self {
        Self(level.clamp(MIN_ZOOM as i32, MAX_ZOOM as i32) as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn scale(self) -> f32 {
        self.0 as f32
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(MIN_ZOOM)
    }
}
