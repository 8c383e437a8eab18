use serde::{Deserialize, Serialize};

/// Position and size of the blocking box, as percentages of the video element's box.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OverlayConfig {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for OverlayConfig {
    /// Bottom-right strip where live chat replays usually sit.
    fn default() -> Self {
        Self {
            top: 89.0,
            height: 11.0,
            left: 62.0,
            width: 38.0,
        }
    }
}

impl OverlayConfig {
    /// Whether the box lies entirely inside the video.
    pub fn is_contained(&self) -> bool {
        self.top >= 0.0
            && self.left >= 0.0
            && self.left + self.width <= 100.0
            && self.top + self.height <= 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_stored_layout() {
        let value = serde_json::to_value(OverlayConfig::default()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "top": 89.0, "left": 62.0, "width": 38.0, "height": 11.0 })
        );
    }

    #[test]
    fn integer_percentages_deserialize() {
        let config: OverlayConfig =
            serde_json::from_str(r#"{"top":10,"left":0,"width":50,"height":20}"#).unwrap();
        assert_eq!(config.width, 50.0);
        assert!(config.is_contained());
    }

    #[test]
    fn overflowing_config_is_not_contained() {
        let config = OverlayConfig {
            top: 95.0,
            left: 70.0,
            width: 38.0,
            height: 11.0,
        };
        assert!(!config.is_contained());
    }
}
