//! WebAssembly side of the Chat Begone extension.
//!
//! The loader scripts call [`start_content_script`] on watch pages and
//! [`start_popup`] from the toolbar popup.

mod browser;
mod content;
mod logging;
mod page;
mod popup;
mod shared;
mod storage;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

pub use page::{Handlers, WebPage};
pub use popup::BrowserTabs;
pub use storage::BrowserStore;

#[wasm_bindgen]
pub fn start_content_script() {
    console_error_panic_hook::set_once();
    spawn_local(async {
        if let Err(e) = content::run().await {
            let message = format!("[Begone] content script failed to start: {e}");
            web_sys::console::error_1(&message.into());
        }
    });
}

#[wasm_bindgen]
pub fn start_popup() {
    console_error_panic_hook::set_once();
    spawn_local(async {
        if let Err(e) = popup::run().await {
            let message = format!("[Begone] popup failed to start: {e}");
            web_sys::console::error_1(&message.into());
        }
    });
}
