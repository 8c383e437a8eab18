//! Popup -> content script notification.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    #[serde(rename = "toggleState", rename_all = "camelCase")]
    ToggleState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel_id: Option<String>,
        is_enabled: bool,
    },
}

impl Message {
    pub fn toggle(channel_id: Option<&str>, is_enabled: bool) -> Self {
        Self::ToggleState {
            channel_id: channel_id.map(str::to_string),
            is_enabled,
        }
    }

    /// Whether a content script showing `current` should act on this message.
    /// A message without a channel addresses whatever channel the tab shows.
    pub fn addresses(&self, current: Option<&str>) -> bool {
        match self {
            Self::ToggleState { channel_id, .. } => match channel_id.as_deref() {
                None => true,
                Some(target) => current == Some(target),
            },
        }
    }
}

/// Delivery of messages to browser tabs.
#[allow(async_fn_in_trait)]
pub trait TabMessenger {
    type TabId: Copy + std::fmt::Debug;

    /// Active tabs of the current window.
    async fn active_tabs(&self) -> Result<Vec<Self::TabId>, Error>;

    async fn send(&self, tab: Self::TabId, message: &Message) -> Result<(), Error>;
}

/// Send `message` to every active tab. A tab without a listening content script is
/// skipped; other tabs still receive the message. Returns the number of deliveries.
pub async fn broadcast<M: TabMessenger>(messenger: &M, message: &Message) -> usize {
    let tabs = match messenger.active_tabs().await {
        Ok(tabs) => tabs,
        Err(e) => {
            debug!(target: "begone::message", error = %e, "could not list active tabs");
            return 0;
        }
    };

    let mut delivered = 0;
    for tab in tabs {
        match messenger.send(tab, message).await {
            Ok(()) => delivered += 1,
            Err(e) => debug!(
                target: "begone::message",
                ?tab,
                error = %e,
                "tab did not accept message"
            ),
        }
    }
    delivered
}
