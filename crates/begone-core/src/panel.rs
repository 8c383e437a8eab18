//! Popup logic: show the active tab's channel and flip its allow-list entry.

use tracing::{info, warn};

use crate::{AllowlistStore, Error, KeyValueStore, Message, TabMessenger, broadcast};

/// Label shown when the active tab has no resolvable channel.
pub const NO_CHANNEL_LABEL: &str = "not detected";

/// Everything the popup renders.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub channel_label: String,
    pub status_text: &'static str,
    pub status_color: &'static str,
    pub toggle_label: &'static str,
    /// Button styling hook: present while the overlay is off.
    pub toggle_inactive: bool,
    pub toggle_disabled: bool,
}

pub struct SettingsPanel<S> {
    allowlist: AllowlistStore<S>,
    channel: Option<String>,
    enabled: bool,
}

impl<S: KeyValueStore> SettingsPanel<S> {
    /// Open the panel for `channel`. An unreadable allow-list shows the channel as
    /// inactive.
    pub async fn open(allowlist: AllowlistStore<S>, channel: Option<String>) -> Self {
        let enabled = match &channel {
            Some(channel) => allowlist.is_channel_enabled(channel).await.unwrap_or_else(|e| {
                warn!(
                    target: "begone::panel",
                    channel = %channel,
                    error = %e,
                    "failed to read allow-list"
                );
                false
            }),
            None => false,
        };

        Self {
            allowlist,
            channel,
            enabled,
        }
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn view(&self) -> PanelView {
        let (status_text, status_color, toggle_label) = if self.enabled {
            ("Active", "green", "Turn OFF")
        } else {
            ("Inactive", "red", "Turn ON")
        };

        PanelView {
            channel_label: self
                .channel
                .clone()
                .unwrap_or_else(|| NO_CHANNEL_LABEL.to_string()),
            status_text,
            status_color,
            toggle_label,
            toggle_inactive: !self.enabled,
            toggle_disabled: self.channel.is_none(),
        }
    }

    /// Flip the channel's allow-list entry, then tell the active tabs.
    ///
    /// Nothing changes when no channel was detected. When the store write fails the
    /// panel keeps its previous state and no message is sent.
    pub async fn toggle<M: TabMessenger>(&mut self, messenger: &M) -> Result<PanelView, Error> {
        let Some(channel) = self.channel.clone() else {
            return Ok(self.view());
        };

        let enabled = !self.enabled;
        self.allowlist.set_channel_enabled(&channel, enabled).await?;
        self.enabled = enabled;
        info!(target: "begone::panel", channel = %channel, enabled, "allow-list updated");

        let delivered = broadcast(messenger, &Message::toggle(Some(&channel), enabled)).await;
        info!(target: "begone::panel", delivered, "notified active tabs");

        Ok(self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTabs, MemoryStore};

    fn tabs() -> FakeTabs {
        FakeTabs {
            tabs: vec![7],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn undetected_channel_disables_toggle() {
        let panel = SettingsPanel::open(AllowlistStore::new(MemoryStore::new()), None).await;
        let view = panel.view();

        assert_eq!(view.channel_label, "not detected");
        assert_eq!(view.status_text, "Inactive");
        assert!(view.toggle_disabled);
    }

    #[tokio::test]
    async fn toggle_without_channel_does_nothing() {
        let mut panel = SettingsPanel::open(AllowlistStore::new(MemoryStore::new()), None).await;
        let tabs = tabs();

        let view = panel.toggle(&tabs).await.unwrap();

        assert!(view.toggle_disabled);
        assert!(tabs.delivered.borrow().is_empty());
        assert_eq!(panel.allowlist.store().writes(), 0);
    }

    #[tokio::test]
    async fn toggle_enables_and_notifies() {
        let mut panel = SettingsPanel::open(
            AllowlistStore::new(MemoryStore::new()),
            Some("UCabc".to_string()),
        )
        .await;
        assert_eq!(panel.view().toggle_label, "Turn ON");
        assert!(panel.view().toggle_inactive);

        let tabs = tabs();
        let view = panel.toggle(&tabs).await.unwrap();

        assert_eq!(view.status_text, "Active");
        assert_eq!(view.status_color, "green");
        assert_eq!(view.toggle_label, "Turn OFF");
        assert!(!view.toggle_inactive);
        assert!(panel.allowlist.is_channel_enabled("UCabc").await.unwrap());
        assert_eq!(
            tabs.delivered.borrow().as_slice(),
            [(7, Message::toggle(Some("UCabc"), true))]
        );
    }

    #[tokio::test]
    async fn reopening_reflects_stored_state() {
        let allowlist = AllowlistStore::new(MemoryStore::new());
        allowlist.set_channel_enabled("UCabc", true).await.unwrap();

        let mut panel = SettingsPanel::open(allowlist, Some("UCabc".to_string())).await;
        assert!(panel.is_enabled());

        panel.toggle(&tabs()).await.unwrap();
        assert!(!panel.is_enabled());
        assert!(!panel.allowlist.is_channel_enabled("UCabc").await.unwrap());
    }

    #[tokio::test]
    async fn failed_write_keeps_state_and_stays_quiet() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let mut panel =
            SettingsPanel::open(AllowlistStore::new(store), Some("UCabc".to_string())).await;
        let tabs = tabs();

        assert!(panel.toggle(&tabs).await.is_err());
        assert!(!panel.is_enabled());
        assert!(tabs.delivered.borrow().is_empty());
    }

    #[tokio::test]
    async fn unreachable_tab_does_not_fail_toggle() {
        let mut panel = SettingsPanel::open(
            AllowlistStore::new(MemoryStore::new()),
            Some("UCabc".to_string()),
        )
        .await;
        let tabs = FakeTabs {
            tabs: vec![1, 2],
            unreachable: vec![1, 2],
            ..Default::default()
        };

        assert!(panel.toggle(&tabs).await.is_ok());
        assert!(panel.is_enabled());
    }
}
