//! The live watch page as a [`PageHost`].

use std::time::Duration;

use begone_core::{Error, PageHost, Rect};
use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{Document, Element, HtmlElement, MouseEvent, ResizeObserver, Window};

use crate::browser::js_error;

/// Static look of the blocking box; geometry is set separately on every update.
const OVERLAY_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("display", "none"),
    ("background-color", "#000"),
    ("z-index", "60"),
    ("cursor", "move"),
    ("user-select", "none"),
];

/// Event handlers wired into the page. They are created once, before the page
/// exists, and live as long as the content script.
pub struct Handlers {
    pub pointer_down: Closure<dyn FnMut(MouseEvent)>,
    pub pointer_move: Closure<dyn FnMut(MouseEvent)>,
    pub pointer_up: Closure<dyn FnMut(MouseEvent)>,
    pub resize: Closure<dyn FnMut()>,
    pub watchdog: Closure<dyn FnMut()>,
}

pub struct WebPage {
    window: Window,
    document: Document,
    handlers: Handlers,
    drag_attached: bool,
    watchdog: Option<i32>,
}

impl WebPage {
    pub fn new(window: Window, document: Document, handlers: Handlers) -> Self {
        Self {
            window,
            document,
            handlers,
            drag_attached: false,
            watchdog: None,
        }
    }

    fn html(node: &Element) -> Result<&HtmlElement, Error> {
        node.dyn_ref::<HtmlElement>()
            .ok_or_else(|| Error::Dom("overlay is not an HTML element".to_string()))
    }
}

fn dom_error(e: JsValue) -> Error {
    Error::Dom(js_error(e))
}

impl PageHost for WebPage {
    type Node = Element;
    type Observer = ResizeObserver;

    fn query(&self, selector: &str) -> Option<Element> {
        // An invalid selector is treated like a miss.
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_href(&self, selector: &str) -> Option<String> {
        let element = self.query(selector)?;
        Reflect::get(&element, &JsValue::from_str("href"))
            .ok()?
            .as_string()
            .filter(|href| !href.is_empty())
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn bounding_rect(&self, node: &Element) -> Rect {
        let rect = node.get_bounding_client_rect();
        Rect::new(rect.x(), rect.y(), rect.width(), rect.height())
    }

    fn create_overlay(&mut self, parent: &Element, id: &str) -> Result<Element, Error> {
        let overlay = self.document.create_element("div").map_err(dom_error)?;
        overlay.set_id(id);

        let style = Self::html(&overlay)?.style();
        for (property, value) in OVERLAY_STYLE {
            style.set_property(property, value).map_err(dom_error)?;
        }

        overlay
            .add_event_listener_with_callback(
                "mousedown",
                self.handlers.pointer_down.as_ref().unchecked_ref(),
            )
            .map_err(dom_error)?;
        parent.append_child(&overlay).map_err(dom_error)?;

        Ok(overlay)
    }

    fn remove(&mut self, node: &Element) {
        node.remove();
    }

    fn apply_rect(&mut self, node: &Element, rect: &Rect) {
        let Ok(element) = Self::html(node) else {
            return;
        };
        let style = element.style();
        let properties = [
            ("top", format!("{}px", rect.top)),
            ("left", format!("{}px", rect.left)),
            ("width", format!("{}px", rect.width)),
            ("height", format!("{}px", rect.height)),
            ("display", "block".to_string()),
        ];
        for (property, value) in properties {
            if let Err(e) = style.set_property(property, &value) {
                tracing::debug!(
                    target: "begone::page",
                    property,
                    error = %js_error(e),
                    "style update rejected"
                );
            }
        }
    }

    fn observe_resize(&mut self, targets: &[&Element]) -> Result<ResizeObserver, Error> {
        let observer =
            ResizeObserver::new(self.handlers.resize.as_ref().unchecked_ref()).map_err(dom_error)?;
        for target in targets {
            observer.observe(target);
        }
        Ok(observer)
    }

    fn disconnect(&mut self, observer: ResizeObserver) {
        observer.disconnect();
    }

    fn attach_drag_listeners(&mut self) -> Result<(), Error> {
        if self.drag_attached {
            return Ok(());
        }

        self.document
            .add_event_listener_with_callback(
                "mousemove",
                self.handlers.pointer_move.as_ref().unchecked_ref(),
            )
            .map_err(dom_error)?;
        if let Err(e) = self.document.add_event_listener_with_callback(
            "mouseup",
            self.handlers.pointer_up.as_ref().unchecked_ref(),
        ) {
            self.detach_drag_listeners();
            return Err(dom_error(e));
        }

        self.drag_attached = true;
        Ok(())
    }

    fn detach_drag_listeners(&mut self) {
        // Removing a listener that is not registered is harmless.
        let _ = self.document.remove_event_listener_with_callback(
            "mousemove",
            self.handlers.pointer_move.as_ref().unchecked_ref(),
        );
        let _ = self.document.remove_event_listener_with_callback(
            "mouseup",
            self.handlers.pointer_up.as_ref().unchecked_ref(),
        );
        self.drag_attached = false;
    }

    fn start_watchdog(&mut self, period: Duration) -> Result<(), Error> {
        self.stop_watchdog();

        let handle = self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                self.handlers.watchdog.as_ref().unchecked_ref(),
                period.as_millis().min(i32::MAX as u128) as i32,
            )
            .map_err(dom_error)?;
        self.watchdog = Some(handle);
        Ok(())
    }

    fn stop_watchdog(&mut self) {
        if let Some(handle) = self.watchdog.take() {
            self.window.clear_interval_with_handle(handle);
        }
    }
}
