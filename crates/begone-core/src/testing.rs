//! In-memory stand-ins for the browser used by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde_json::Value;

use crate::{
    Error, KeyValueStore, Message, PageHost, Settings, TabMessenger,
    overlay::Rect,
};

/// Storage area backed by a map, with switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, Value>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        if self.fail_reads.get() {
            return Err(Error::Storage(format!("read of {key} refused")));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        if self.fail_writes.get() {
            return Err(Error::Storage(format!("write of {key} refused")));
        }
        self.insert(key, value);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Recording fake of the watch page. Nodes are plain integers.
#[derive(Default)]
pub struct FakePage {
    next_node: u32,
    selectors: HashMap<String, u32>,
    hrefs: HashMap<String, String>,
    ids: HashMap<String, u32>,
    connected: HashSet<u32>,
    rects: HashMap<u32, Rect>,
    pub styles: HashMap<u32, Rect>,
    pub style_writes: usize,
    pub removed: Vec<u32>,
    pub observers: HashMap<u32, Vec<u32>>,
    pub disconnected_observers: Vec<u32>,
    pub drag_listeners: bool,
    pub watchdog: Option<Duration>,
    pub watchdog_starts: usize,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self) -> u32 {
        self.next_node += 1;
        self.connected.insert(self.next_node);
        self.next_node
    }

    /// Mount a fresh player/video pair under the default selectors, replacing any
    /// previous pair the way an SPA navigation does.
    pub fn mount_player(&mut self, player: Rect, video: Rect) -> (u32, u32) {
        let settings = Settings::default();
        self.unmount_player();

        let player_node = self.node();
        let video_node = self.node();
        self.rects.insert(player_node, player);
        self.rects.insert(video_node, video);
        self.selectors.insert(settings.player_selector, player_node);
        self.selectors.insert(settings.video_selector, video_node);
        (player_node, video_node)
    }

    /// Detach the current player/video pair (and anything appended under it).
    pub fn unmount_player(&mut self) {
        let settings = Settings::default();
        for selector in [&settings.player_selector, &settings.video_selector] {
            if let Some(node) = self.selectors.remove(selector) {
                self.connected.remove(&node);
            }
        }
    }

    pub fn set_rect(&mut self, node: u32, rect: Rect) {
        self.rects.insert(node, rect);
    }

    pub fn set_href(&mut self, selector: &str, href: &str) {
        self.hrefs.insert(selector.to_string(), href.to_string());
    }

    pub fn clear_hrefs(&mut self) {
        self.hrefs.clear();
    }

    /// Plant an element with `id` that no controller knows about.
    pub fn plant_element(&mut self, id: &str) -> u32 {
        let node = self.node();
        self.ids.insert(id.to_string(), node);
        node
    }

    pub fn overlay(&self) -> Option<u32> {
        self.ids
            .get(&Settings::default().overlay_id)
            .copied()
            .filter(|node| self.connected.contains(node))
    }

    pub fn active_observers(&self) -> usize {
        self.observers.len()
    }
}

impl PageHost for FakePage {
    type Node = u32;
    type Observer = u32;

    fn query(&self, selector: &str) -> Option<u32> {
        self.selectors.get(selector).copied()
    }

    fn query_href(&self, selector: &str) -> Option<String> {
        self.hrefs.get(selector).cloned()
    }

    fn element_by_id(&self, id: &str) -> Option<u32> {
        self.ids.get(id).copied().filter(|n| self.connected.contains(n))
    }

    fn is_connected(&self, node: &u32) -> bool {
        self.connected.contains(node)
    }

    fn bounding_rect(&self, node: &u32) -> Rect {
        self.rects.get(node).copied().unwrap_or_default()
    }

    fn create_overlay(&mut self, _parent: &u32, id: &str) -> Result<u32, Error> {
        let node = self.node();
        self.ids.insert(id.to_string(), node);
        Ok(node)
    }

    fn remove(&mut self, node: &u32) {
        if self.connected.remove(node) {
            self.removed.push(*node);
        }
        self.styles.remove(node);
    }

    fn apply_rect(&mut self, node: &u32, rect: &Rect) {
        self.styles.insert(*node, *rect);
        self.style_writes += 1;
    }

    fn observe_resize(&mut self, targets: &[&u32]) -> Result<u32, Error> {
        let observer = self.node();
        self.observers
            .insert(observer, targets.iter().map(|n| **n).collect());
        Ok(observer)
    }

    fn disconnect(&mut self, observer: u32) {
        self.observers.remove(&observer);
        self.disconnected_observers.push(observer);
    }

    fn attach_drag_listeners(&mut self) -> Result<(), Error> {
        self.drag_listeners = true;
        Ok(())
    }

    fn detach_drag_listeners(&mut self) {
        self.drag_listeners = false;
    }

    fn start_watchdog(&mut self, period: Duration) -> Result<(), Error> {
        self.watchdog = Some(period);
        self.watchdog_starts += 1;
        Ok(())
    }

    fn stop_watchdog(&mut self) {
        self.watchdog = None;
    }
}

/// Messenger over a fixed set of tabs; tabs listed in `unreachable` reject delivery.
#[derive(Default)]
pub struct FakeTabs {
    pub tabs: Vec<u32>,
    pub unreachable: Vec<u32>,
    pub fail_query: bool,
    pub delivered: RefCell<Vec<(u32, Message)>>,
}

impl TabMessenger for FakeTabs {
    type TabId = u32;

    async fn active_tabs(&self) -> Result<Vec<u32>, Error> {
        if self.fail_query {
            return Err(Error::Messaging("tabs.query failed".to_string()));
        }
        Ok(self.tabs.clone())
    }

    async fn send(&self, tab: u32, message: &Message) -> Result<(), Error> {
        if self.unreachable.contains(&tab) {
            return Err(Error::Messaging(format!("no receiver in tab {tab}")));
        }
        self.delivered.borrow_mut().push((tab, message.clone()));
        Ok(())
    }
}
