//! Overlay lifecycle for one page.
//!
//! The controller is either `Disabled`, `Searching` for a player, or `Bound` to one.
//! Every entry point (watchdog tick, resize, pointer events, storage completions,
//! popup messages) goes through `&mut self`, and each of them is safe to repeat: the
//! host page may fire them in any order and any number of times.

use tracing::{debug, info, trace, warn};

use super::{DragSession, OverlayConfig, PageHost, Point, geometry};
use crate::{
    AllowlistStore, ChannelSources, ChannelState, KeyValueStore, Message, Settings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disabled,
    Searching,
    Bound,
}

/// Nodes the overlay is currently attached to. Dropped as a whole whenever the page
/// swaps its player or video.
struct PlayerBinding<N, O> {
    player: N,
    video: N,
    overlay: N,
    observer: Option<O>,
}

/// Geometry to write back once a drag ends.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistRequest {
    pub channel: Option<String>,
    pub config: OverlayConfig,
}

impl PersistRequest {
    /// Write the geometry. A failure is logged and dropped; the overlay keeps its
    /// in-memory position either way.
    pub async fn commit<S: KeyValueStore>(self, allowlist: &AllowlistStore<S>) {
        match allowlist
            .save_config(self.channel.as_deref(), &self.config)
            .await
        {
            Ok(()) => debug!(
                target: "begone::controller",
                config = ?self.config,
                "saved overlay geometry"
            ),
            Err(e) => warn!(
                target: "begone::controller",
                error = %e,
                "failed to save overlay geometry"
            ),
        }
    }
}

/// State for `channel`, or the disabled state when no channel was found.
pub async fn fetch_channel_state<S: KeyValueStore>(
    allowlist: &AllowlistStore<S>,
    channel: Option<&str>,
) -> ChannelState {
    match channel {
        Some(channel) => allowlist.load_channel_state(channel).await,
        None => ChannelState::default(),
    }
}

/// Geometry an enabling `message` should start from, resolved for `channel` by the
/// usual precedence. Other messages need nothing from storage.
pub async fn fetch_message_geometry<S: KeyValueStore>(
    allowlist: &AllowlistStore<S>,
    channel: Option<&str>,
    message: &Message,
) -> Option<OverlayConfig> {
    let Message::ToggleState { is_enabled: true, .. } = message else {
        return None;
    };

    match channel {
        Some(channel) => allowlist.load_geometry(channel).await,
        None => allowlist.load_global_config().await.unwrap_or_else(|e| {
            warn!(target: "begone::controller", error = %e, "failed to read saved geometry");
            None
        }),
    }
}

pub struct Controller<H: PageHost> {
    host: H,
    settings: Settings,
    config: OverlayConfig,
    channel: Option<String>,
    enabled: bool,
    binding: Option<PlayerBinding<H::Node, H::Observer>>,
    drag: Option<DragSession>,
    watchdog_running: bool,
}

impl<H: PageHost> Controller<H> {
    pub fn new(host: H, settings: Settings) -> Self {
        Self {
            host,
            config: settings.default_config,
            settings,
            channel: None,
            enabled: false,
            binding: None,
            drag: None,
            watchdog_running: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn phase(&self) -> Phase {
        match (self.enabled, &self.binding) {
            (false, _) => Phase::Disabled,
            (true, None) => Phase::Searching,
            (true, Some(_)) => Phase::Bound,
        }
    }

    pub fn resolve_channel(&self) -> Option<String> {
        ChannelSources::from_page(&self.host, &self.settings).resolve()
    }

    /// Re-resolve the channel. Returns the new value only when it differs from the
    /// one the current state was loaded for.
    pub fn poll_channel(&self) -> Option<Option<String>> {
        let resolved = self.resolve_channel();
        (resolved != self.channel).then_some(resolved)
    }

    /// Adopt freshly loaded storage state for `channel`.
    pub fn apply_channel_state(&mut self, channel: Option<String>, state: ChannelState) {
        if channel != self.channel {
            info!(
                target: "begone::controller",
                from = ?self.channel,
                to = ?channel,
                "channel changed"
            );
        }
        self.channel = channel;

        if self.channel.is_none() || !state.enabled {
            self.disable();
            return;
        }

        self.config = state.config.unwrap_or(self.settings.default_config);
        self.enable();
        self.update_position();
    }

    /// Apply a popup message. Returns whether it addressed this page.
    ///
    /// `geometry` comes from [`fetch_message_geometry`] and is adopted when the
    /// message switches a disabled overlay on; `None` falls back to the default.
    pub fn handle_message(&mut self, message: &Message, geometry: Option<OverlayConfig>) -> bool {
        if !message.addresses(self.channel.as_deref()) {
            debug!(
                target: "begone::controller",
                ?message,
                channel = ?self.channel,
                "message for another channel"
            );
            return false;
        }

        match message {
            Message::ToggleState { is_enabled, .. } => {
                if *is_enabled {
                    if !self.enabled {
                        self.config = geometry.unwrap_or(self.settings.default_config);
                    }
                    self.enable();
                    self.update_position();
                } else {
                    self.disable();
                }
            }
        }
        true
    }

    pub fn enable(&mut self) {
        if !self.enabled {
            info!(target: "begone::controller", channel = ?self.channel, "overlay enabled");
        }
        self.enabled = true;
        self.start_watchdog();
    }

    pub fn disable(&mut self) {
        if self.enabled {
            info!(target: "begone::controller", channel = ?self.channel, "overlay disabled");
        }
        self.enabled = false;
        self.cleanup();
    }

    /// Run one `ensure_box` pass and arm the recurring timer. No-op while running.
    pub fn start_watchdog(&mut self) {
        if self.watchdog_running {
            return;
        }

        self.ensure_box();

        match self.host.start_watchdog(self.settings.watchdog_interval()) {
            Ok(()) => self.watchdog_running = true,
            Err(e) => warn!(target: "begone::controller", error = %e, "failed to start watchdog"),
        }
    }

    pub fn stop_watchdog(&mut self) {
        self.host.stop_watchdog();
        self.watchdog_running = false;
    }

    /// Full teardown: timer, drag listeners, observer and overlay.
    pub fn cleanup(&mut self) {
        self.stop_watchdog();
        self.release_binding();
    }

    /// Drop the current binding while leaving the watchdog armed, so the next tick
    /// can search again.
    pub fn release_binding(&mut self) {
        self.drag = None;
        self.host.detach_drag_listeners();

        if let Some(binding) = self.binding.take() {
            if let Some(observer) = binding.observer {
                self.host.disconnect(observer);
            }
            self.host.remove(&binding.overlay);
        }

        // The reference may have been lost while the element survived.
        if let Some(stray) = self.host.element_by_id(&self.settings.overlay_id) {
            self.host.remove(&stray);
        }
    }

    /// Watchdog tick: (re)bind to the page's current player and reposition.
    pub fn ensure_box(&mut self) {
        if !self.enabled {
            return;
        }

        let player = self.host.query(&self.settings.player_selector);
        let video = self.host.query(&self.settings.video_selector);

        let stale = self.binding.as_ref().is_some_and(|binding| {
            player.as_ref() != Some(&binding.player)
                || video.as_ref() != Some(&binding.video)
                || !self.host.is_connected(&binding.player)
                || !self.host.is_connected(&binding.video)
        });
        if stale {
            info!(target: "begone::controller", "player replaced, rebinding overlay");
            self.release_binding();
        }

        let (Some(player), Some(video)) = (player, video) else {
            trace!(target: "begone::controller", "player not ready");
            return;
        };

        if self.binding.is_none() {
            self.bind(player, video);
        }

        self.update_position();
    }

    fn bind(&mut self, player: H::Node, video: H::Node) {
        if let Some(stray) = self.host.element_by_id(&self.settings.overlay_id) {
            self.host.remove(&stray);
        }

        let overlay = match self.host.create_overlay(&player, &self.settings.overlay_id) {
            Ok(overlay) => overlay,
            Err(e) => {
                warn!(target: "begone::controller", error = %e, "failed to create overlay");
                return;
            }
        };

        let observer = match self.host.observe_resize(&[&player, &video]) {
            Ok(observer) => Some(observer),
            Err(e) => {
                warn!(
                    target: "begone::controller",
                    error = %e,
                    "failed to observe player size, relying on watchdog"
                );
                None
            }
        };

        self.binding = Some(PlayerBinding {
            player,
            video,
            overlay,
            observer,
        });
        info!(target: "begone::controller", channel = ?self.channel, "overlay attached");
    }

    /// Recompute the overlay's pixel box from the current configuration.
    ///
    /// A detached player drops the binding; a video without area leaves the overlay
    /// exactly as it was.
    pub fn update_position(&mut self) {
        if !self.enabled {
            return;
        }
        let Some(binding) = &self.binding else {
            return;
        };

        if !self.host.is_connected(&binding.player) || !self.host.is_connected(&binding.video) {
            debug!(target: "begone::controller", "bound player detached");
            self.release_binding();
            return;
        }

        let video = self.host.bounding_rect(&binding.video);
        let player = self.host.bounding_rect(&binding.player);

        match geometry::overlay_rect(&player, &video, &self.config) {
            Some(rect) => self.host.apply_rect(&binding.overlay, &rect),
            None => trace!(target: "begone::controller", "video has no size yet"),
        }
    }

    /// Window resize or observed size change.
    pub fn on_resize(&mut self) {
        self.update_position();
    }

    /// Pointer pressed on the overlay. Returns whether a drag started.
    pub fn begin_drag(&mut self, pointer: Point) -> bool {
        if !self.enabled || self.binding.is_none() {
            return false;
        }

        if let Err(e) = self.host.attach_drag_listeners() {
            warn!(target: "begone::controller", error = %e, "failed to attach drag listeners");
            return false;
        }

        self.drag = Some(DragSession::begin(pointer, &self.config));
        true
    }

    pub fn drag_to(&mut self, pointer: Point) {
        let (Some(session), Some(binding)) = (self.drag, &self.binding) else {
            return;
        };

        let video = self.host.bounding_rect(&binding.video);
        if let Some(config) = session.drag_to(pointer, &video, &self.config) {
            self.config = config;
            self.update_position();
        }
    }

    /// Pointer released. Listeners are detached unconditionally; the finished
    /// session's geometry is returned for persisting.
    pub fn end_drag(&mut self) -> Option<PersistRequest> {
        self.host.detach_drag_listeners();
        let session = self.drag.take()?;

        debug!(
            target: "begone::controller",
            start = ?session.start(),
            config = ?self.config,
            "drag finished"
        );
        Some(PersistRequest {
            channel: self.channel.clone(),
            config: self.config,
        })
    }
}
