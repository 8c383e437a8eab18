//! Percent-to-pixel conversion for the overlay box.
//!
//! The overlay is parented under the player container, while the configuration is
//! relative to the video element. Both rectangles are measured in viewport
//! coordinates, so the video's offset inside the player absorbs any letterboxing or
//! player chrome around the video.

use super::OverlayConfig;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A rectangle with no area has not been laid out yet.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Pointer position in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Compute the overlay rectangle relative to the player container.
///
/// Returns `None` while the video reports a zero-sized box, so callers keep whatever
/// style the overlay already has instead of collapsing it.
pub fn overlay_rect(player: &Rect, video: &Rect, config: &OverlayConfig) -> Option<Rect> {
    if !video.has_area() {
        return None;
    }

    let video_top = video.top - player.top;
    let video_left = video.left - player.left;

    Some(Rect {
        left: video_left + video.width * (config.left / 100.0),
        top: video_top + video.height * (config.top / 100.0),
        width: video.width * (config.width / 100.0),
        height: video.height * (config.height / 100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_config_on_800x450_video() {
        let player = Rect::new(0.0, 0.0, 800.0, 450.0);
        let video = Rect::new(0.0, 0.0, 800.0, 450.0);

        let rect = overlay_rect(&player, &video, &OverlayConfig::default()).unwrap();

        assert_close(rect.left, 496.0);
        assert_close(rect.top, 400.5);
        assert_close(rect.width, 304.0);
        assert_close(rect.height, 49.5);
    }

    #[test]
    fn letterboxed_video_is_offset_inside_player() {
        let player = Rect::new(100.0, 50.0, 1000.0, 600.0);
        let video = Rect::new(200.0, 50.0, 800.0, 600.0);
        let config = OverlayConfig {
            top: 0.0,
            left: 0.0,
            width: 50.0,
            height: 50.0,
        };

        let rect = overlay_rect(&player, &video, &config).unwrap();

        assert_close(rect.left, 100.0);
        assert_close(rect.top, 0.0);
        assert_close(rect.width, 400.0);
        assert_close(rect.height, 300.0);
    }

    #[test]
    fn zero_area_video_yields_nothing() {
        let player = Rect::new(0.0, 0.0, 800.0, 450.0);
        let config = OverlayConfig::default();

        assert!(overlay_rect(&player, &Rect::new(0.0, 0.0, 0.0, 450.0), &config).is_none());
        assert!(overlay_rect(&player, &Rect::new(0.0, 0.0, 800.0, 0.0), &config).is_none());
    }

    #[test]
    fn contained_configs_stay_inside_video_box() {
        let player = Rect::new(13.0, 7.0, 1280.0, 760.0);
        let videos = [
            Rect::new(13.0, 47.0, 1280.0, 720.0),
            Rect::new(173.0, 7.0, 960.0, 760.0),
            Rect::new(20.5, 9.25, 333.3, 187.7),
        ];
        let steps = [0.0, 1.0, 12.5, 33.3, 50.0, 62.0, 89.0, 99.0, 100.0];

        for video in &videos {
            for &width in &steps[1..] {
                for &height in &steps[1..] {
                    for &left in steps.iter().filter(|l| **l + width <= 100.0) {
                        for &top in steps.iter().filter(|t| **t + height <= 100.0) {
                            let config = OverlayConfig {
                                top,
                                left,
                                width,
                                height,
                            };
                            let rect = overlay_rect(&player, video, &config).unwrap();

                            // Back into viewport coordinates to compare with the video.
                            let absolute = Rect::new(
                                rect.left + player.left,
                                rect.top + player.top,
                                rect.width,
                                rect.height,
                            );
                            assert!(absolute.left >= video.left - EPSILON);
                            assert!(absolute.top >= video.top - EPSILON);
                            assert!(absolute.right() <= video.right() + 1e-6);
                            assert!(absolute.bottom() <= video.bottom() + 1e-6);
                        }
                    }
                }
            }
        }
    }
}
