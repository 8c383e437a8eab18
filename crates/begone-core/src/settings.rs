use std::time::Duration;

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::{KeyValueStore, overlay::OverlayConfig};

/// Storage key for optional setting overrides.
pub const SETTINGS_KEY: &str = "chatBegoneSettings";

/// Runtime settings for the content script and popup.
/// Every field has a default; overrides live under [`SETTINGS_KEY`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StoredSettings")]
pub struct Settings {
    pub player_selector: String,
    pub video_selector: String,
    pub channel_link_selector: String,
    pub channel_meta_selector: String,
    pub overlay_id: String,
    pub watchdog_interval_ms: u64,
    pub channel_poll_interval_ms: u64,
    pub default_config: OverlayConfig,
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_selector: ".html5-video-player".to_string(),
            video_selector: "video.html5-main-video".to_string(),
            channel_link_selector: "ytd-channel-name a".to_string(),
            channel_meta_selector: r#"link[itemprop="url"][href*="youtube.com"]"#.to_string(),
            overlay_id: "chat-begone-box".to_string(),
            watchdog_interval_ms: 1500,
            channel_poll_interval_ms: 2000,
            default_config: OverlayConfig::default(),
            debug_logging: false,
        }
    }
}

/// Overrides as stored. Missing and malformed fields are `None`, so one bad value
/// never discards the rest.
#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredSettings {
    #[serde(deserialize_with = "lenient")]
    player_selector: Option<String>,
    #[serde(deserialize_with = "lenient")]
    video_selector: Option<String>,
    #[serde(deserialize_with = "lenient")]
    channel_link_selector: Option<String>,
    #[serde(deserialize_with = "lenient")]
    channel_meta_selector: Option<String>,
    #[serde(deserialize_with = "lenient")]
    overlay_id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    watchdog_interval_ms: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    channel_poll_interval_ms: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    default_config: Option<OverlayConfig>,
    #[serde(deserialize_with = "lenient")]
    debug_logging: Option<bool>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match T::deserialize(&value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            warn!(target: "begone::settings", %value, error = %e, "invalid setting, using default");
            Ok(None)
        }
    }
}

fn selector(stored: Option<String>, fallback: String) -> String {
    stored.filter(|s| !s.trim().is_empty()).unwrap_or(fallback)
}

fn interval(stored: Option<u64>, fallback: u64) -> u64 {
    stored.filter(|ms| *ms > 0).unwrap_or(fallback)
}

impl From<StoredSettings> for Settings {
    fn from(stored: StoredSettings) -> Self {
        let defaults = Settings::default();
        Self {
            player_selector: selector(stored.player_selector, defaults.player_selector),
            video_selector: selector(stored.video_selector, defaults.video_selector),
            channel_link_selector: selector(
                stored.channel_link_selector,
                defaults.channel_link_selector,
            ),
            channel_meta_selector: selector(
                stored.channel_meta_selector,
                defaults.channel_meta_selector,
            ),
            overlay_id: selector(stored.overlay_id, defaults.overlay_id),
            watchdog_interval_ms: interval(
                stored.watchdog_interval_ms,
                defaults.watchdog_interval_ms,
            ),
            channel_poll_interval_ms: interval(
                stored.channel_poll_interval_ms,
                defaults.channel_poll_interval_ms,
            ),
            default_config: stored.default_config.unwrap_or(defaults.default_config),
            debug_logging: stored.debug_logging.unwrap_or(defaults.debug_logging),
        }
    }
}

impl Settings {
    /// Load overrides from the store. A failed read or a value that is not an
    /// object is logged and yields defaults.
    pub async fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(SETTINGS_KEY).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(target: "begone::settings", error = %e, "ignoring malformed settings");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(
                    target: "begone::settings",
                    error = %e,
                    "failed to read settings, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_interval_ms)
    }

    pub fn channel_poll_interval(&self) -> Duration {
        Duration::from_millis(self.channel_poll_interval_ms)
    }
}
