use super::{OverlayConfig, Point, Rect};

/// Baseline captured when the pointer goes down on the overlay.
///
/// Lives for exactly one press-to-release interval; the controller consumes it on
/// release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    start: Point,
    start_left: f64,
    start_top: f64,
}

impl DragSession {
    pub fn begin(pointer: Point, config: &OverlayConfig) -> Self {
        Self {
            start: pointer,
            start_left: config.left,
            start_top: config.top,
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    /// Configuration for the current pointer position.
    ///
    /// Pixel deltas are converted against the video box as measured now, then clamped
    /// so the box never leaves the video's edges. Returns `None` while the video has
    /// no area.
    pub fn drag_to(
        &self,
        pointer: Point,
        video: &Rect,
        config: &OverlayConfig,
    ) -> Option<OverlayConfig> {
        if !video.has_area() {
            return None;
        }

        let delta_left = (pointer.x - self.start.x) / video.width * 100.0;
        let delta_top = (pointer.y - self.start.y) / video.height * 100.0;

        Some(OverlayConfig {
            left: clamp_percent(self.start_left + delta_left, config.width),
            top: clamp_percent(self.start_top + delta_top, config.height),
            ..*config
        })
    }
}

/// Clamp an offset to `[0, 100 - extent]`.
///
/// An extent above 100 leaves no room at all, so the offset pins to 0.
fn clamp_percent(value: f64, extent: f64) -> f64 {
    value.min(100.0 - extent).max(0.0)
}
