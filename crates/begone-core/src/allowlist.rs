//! Per-channel allow-list kept in extension storage.
//!
//! Presence of a channel's record is what enables the overlay; disabling deletes the
//! record outright. There is no global on/off switch.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Error, KeyValueStore,
    overlay::OverlayConfig,
    store::{get_json, set_json},
};

/// Storage key of the channel map.
pub const CHANNELS_KEY: &str = "chatBegoneChannels";
/// Storage key of the geometry saved by the most recent drag.
pub const CONFIG_KEY: &str = "chatBegoneConfig";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub enabled: bool,
    /// Milliseconds since the Unix epoch at which the channel was enabled.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<OverlayConfig>,
}

/// Channel id -> record, in the order channels were enabled.
pub type ChannelAllowlist = IndexMap<String, ChannelRecord>;

/// What the content script needs to know about its channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub enabled: bool,
    /// Geometry to use, already resolved by precedence. `None` means the built-in
    /// default.
    pub config: Option<OverlayConfig>,
}

pub struct AllowlistStore<S> {
    store: S,
    clock: Box<dyn Fn() -> i64>,
}

impl<S: KeyValueStore> AllowlistStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, || chrono::Utc::now().timestamp_millis())
    }

    pub fn with_clock(store: S, clock: impl Fn() -> i64 + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn channels(&self) -> Result<ChannelAllowlist, Error> {
        Ok(get_json(&self.store, CHANNELS_KEY).await?.unwrap_or_default())
    }

    pub async fn is_channel_enabled(&self, channel: &str) -> Result<bool, Error> {
        Ok(self.channels().await?.contains_key(channel))
    }

    /// Enabling writes a fresh record stamped with the current time; disabling
    /// removes the record.
    pub async fn set_channel_enabled(&self, channel: &str, enabled: bool) -> Result<(), Error> {
        let mut channels = self.channels().await?;

        if enabled {
            let record = ChannelRecord {
                enabled: true,
                timestamp: (self.clock)(),
                config: None,
            };
            channels.insert(channel.to_string(), record);
        } else if channels.shift_remove(channel).is_none() {
            debug!(target: "begone::allowlist", channel, "channel was not allow-listed");
        }

        set_json(&self.store, CHANNELS_KEY, &channels).await
    }

    /// Geometry stored on the channel's own record, if any.
    pub async fn load_config(&self, channel: &str) -> Result<Option<OverlayConfig>, Error> {
        Ok(self
            .channels()
            .await?
            .get(channel)
            .and_then(|record| record.config))
    }

    pub async fn load_global_config(&self) -> Result<Option<OverlayConfig>, Error> {
        get_json(&self.store, CONFIG_KEY).await
    }

    /// Resolve the state for `channel`.
    ///
    /// A failed read of the allow-list counts as "not allow-listed"; a failed
    /// geometry read only loses the geometry.
    pub async fn load_channel_state(&self, channel: &str) -> ChannelState {
        let channels = match self.channels().await {
            Ok(channels) => channels,
            Err(e) => {
                warn!(
                    target: "begone::allowlist",
                    channel,
                    error = %e,
                    "failed to read allow-list"
                );
                return ChannelState::default();
            }
        };

        let Some(record) = channels.get(channel) else {
            return ChannelState::default();
        };

        ChannelState {
            enabled: true,
            config: self.resolve_geometry(Some(record)).await,
        }
    }

    /// Geometry for `channel` regardless of whether it is allow-listed yet.
    pub async fn load_geometry(&self, channel: &str) -> Option<OverlayConfig> {
        let channels = self.channels().await.unwrap_or_else(|e| {
            warn!(target: "begone::allowlist", channel, error = %e, "failed to read allow-list");
            ChannelAllowlist::new()
        });
        self.resolve_geometry(channels.get(channel)).await
    }

    /// Geometry precedence: the channel record's config, then the last dragged
    /// geometry, then `None` (the caller's default).
    async fn resolve_geometry(&self, record: Option<&ChannelRecord>) -> Option<OverlayConfig> {
        if let Some(config) = record.and_then(|record| record.config) {
            return Some(config);
        }
        self.load_global_config().await.unwrap_or_else(|e| {
            warn!(target: "begone::allowlist", error = %e, "failed to read saved geometry");
            None
        })
    }

    /// Persist geometry after a drag: always as the global last-used value, and on
    /// the channel's record when the channel is allow-listed.
    pub async fn save_config(
        &self,
        channel: Option<&str>,
        config: &OverlayConfig,
    ) -> Result<(), Error> {
        set_json(&self.store, CONFIG_KEY, config).await?;

        let Some(channel) = channel else {
            return Ok(());
        };

        let mut channels = self.channels().await?;
        if let Some(record) = channels.get_mut(channel) {
            record.config = Some(*config);
            set_json(&self.store, CHANNELS_KEY, &channels).await?;
        }

        Ok(())
    }
}
