//! The page surface the overlay controller drives.
//!
//! In the extension this is the live DOM of the watch page; tests substitute a
//! recording fake. Node handles compare by identity, which is how SPA navigation is
//! detected: the host page swaps its player and video nodes without reloading.

use std::time::Duration;

use super::Rect;
use crate::Error;

pub trait PageHost {
    /// Handle to a DOM element. Equality must mean "same node", not "equal markup".
    type Node: Clone + PartialEq;
    /// Handle to a live size observer.
    type Observer;

    /// First element matching `selector`, if any.
    fn query(&self, selector: &str) -> Option<Self::Node>;

    /// `href` of the first element matching `selector`, if it has one.
    fn query_href(&self, selector: &str) -> Option<String>;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Bounding box in viewport coordinates.
    fn bounding_rect(&self, node: &Self::Node) -> Rect;

    /// Create the overlay element with `id`, append it under `parent` and wire its
    /// pointer-down handler.
    fn create_overlay(&mut self, parent: &Self::Node, id: &str) -> Result<Self::Node, Error>;

    fn remove(&mut self, node: &Self::Node);

    /// Position `node` absolutely at `rect` (relative to its parent) and show it.
    fn apply_rect(&mut self, node: &Self::Node, rect: &Rect);

    /// Observe size changes of every node in `targets` with a single observer.
    fn observe_resize(&mut self, targets: &[&Self::Node]) -> Result<Self::Observer, Error>;

    fn disconnect(&mut self, observer: Self::Observer);

    /// Attach document-wide pointer move/up listeners for an active drag.
    /// Attaching twice must not register the listeners twice.
    fn attach_drag_listeners(&mut self) -> Result<(), Error>;

    /// Must be a no-op when nothing is attached.
    fn detach_drag_listeners(&mut self);

    /// Arm the recurring watchdog timer.
    fn start_watchdog(&mut self, period: Duration) -> Result<(), Error>;

    /// Must be a no-op when no timer is armed.
    fn stop_watchdog(&mut self);
}
