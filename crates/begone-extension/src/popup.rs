//! Popup page: resolve the active tab's channel and flip its allow-list entry.

use std::cell::RefCell;
use std::rc::Rc;

use begone_core::{
    AllowlistStore, ChannelSources, Error, Message, PanelView, Settings, SettingsPanel,
    TabMessenger,
};
use js_sys::{Array, Function, Object, Reflect};
use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement};

use crate::browser::{self, js_error};
use crate::logging;
use crate::storage::BrowserStore;

const CHANNEL_LABEL_ID: &str = "channel-id";
const STATUS_ID: &str = "status-text";
const TOGGLE_ID: &str = "toggle-btn";

/// Runs inside the inspected tab; must not capture anything from this realm.
const LOOKUP_BODY: &str = r#"
    const href = (selector) => {
        const element = document.querySelector(selector);
        return element && element.href ? element.href : null;
    };
    return {
        channelLink: href(linkSelector),
        metaLink: href(metaSelector),
        pageUrl: location.href,
    };
"#;

/// `browser.tabs` as a [`TabMessenger`].
pub struct BrowserTabs;

#[derive(Debug, Deserialize)]
struct TabInfo {
    id: Option<i32>,
    url: Option<String>,
}

async fn query_active_tabs() -> Result<Vec<TabInfo>, Error> {
    let tabs = browser::api(&["tabs"])?;
    let filter = Object::new();
    Reflect::set(&filter, &"active".into(), &JsValue::TRUE)
        .map_err(|e| Error::Messaging(js_error(e)))?;
    Reflect::set(&filter, &"currentWindow".into(), &JsValue::TRUE)
        .map_err(|e| Error::Messaging(js_error(e)))?;

    let result = browser::call(&tabs, "query", &[filter.into()])
        .await
        .map_err(|e| Error::Messaging(js_error(e)))?;
    Ok(serde_json::from_value(browser::to_json(&result)?)?)
}

impl TabMessenger for BrowserTabs {
    type TabId = i32;

    async fn active_tabs(&self) -> Result<Vec<i32>, Error> {
        Ok(query_active_tabs()
            .await?
            .into_iter()
            .filter_map(|tab| tab.id)
            .collect())
    }

    async fn send(&self, tab: i32, message: &Message) -> Result<(), Error> {
        let tabs = browser::api(&["tabs"])?;
        let payload = browser::from_json(&serde_json::to_value(message)?)?;
        browser::call(&tabs, "sendMessage", &[JsValue::from(tab), payload])
            .await
            .map_err(|e| Error::Messaging(js_error(e)))?;
        Ok(())
    }
}

/// Ask the tab itself where its channel links point, falling back to the tab URL
/// when script injection is unavailable or refused.
async fn lookup_channel(tab: &TabInfo, settings: &Settings) -> Option<String> {
    let fallback = ChannelSources {
        page_url: tab.url.clone(),
        ..Default::default()
    };
    let Some(tab_id) = tab.id else {
        return fallback.resolve();
    };

    match inject_lookup(tab_id, settings).await {
        Ok(sources) => sources.resolve().or_else(|| fallback.resolve()),
        Err(e) => {
            tracing::debug!(
                target: "begone::popup",
                tab = tab_id,
                error = %e,
                "channel lookup injection failed"
            );
            fallback.resolve()
        }
    }
}

async fn inject_lookup(tab_id: i32, settings: &Settings) -> Result<ChannelSources, Error> {
    let scripting = browser::api(&["scripting"])?;

    let target = Object::new();
    Reflect::set(&target, &"tabId".into(), &JsValue::from(tab_id))
        .map_err(|e| Error::Dom(js_error(e)))?;

    let lookup = Function::new_with_args("linkSelector, metaSelector", LOOKUP_BODY);
    let args: Array = [
        JsValue::from_str(&settings.channel_link_selector),
        JsValue::from_str(&settings.channel_meta_selector),
    ]
    .iter()
    .collect();

    let injection = Object::new();
    Reflect::set(&injection, &"target".into(), &target).map_err(|e| Error::Dom(js_error(e)))?;
    Reflect::set(&injection, &"func".into(), &lookup).map_err(|e| Error::Dom(js_error(e)))?;
    Reflect::set(&injection, &"args".into(), &args).map_err(|e| Error::Dom(js_error(e)))?;

    let results = browser::call(&scripting, "executeScript", &[injection.into()])
        .await
        .map_err(|e| Error::Dom(js_error(e)))?;

    let first = Array::from(&results).get(0);
    let result = Reflect::get(&first, &"result".into()).map_err(|e| Error::Dom(js_error(e)))?;
    Ok(serde_json::from_value(browser::to_json(&result)?)?)
}

fn element(document: &Document, id: &str) -> Result<Element, Error> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| Error::Dom(format!("popup element #{id} is missing")))
}

struct PopupView {
    channel_label: Element,
    status: Element,
    toggle: Element,
}

impl PopupView {
    fn from_document(document: &Document) -> Result<Self, Error> {
        Ok(Self {
            channel_label: element(document, CHANNEL_LABEL_ID)?,
            status: element(document, STATUS_ID)?,
            toggle: element(document, TOGGLE_ID)?,
        })
    }

    fn render(&self, view: &PanelView) {
        self.channel_label.set_text_content(Some(&view.channel_label));

        self.status.set_text_content(Some(view.status_text));
        if let Some(status) = self.status.dyn_ref::<HtmlElement>() {
            let _ = status.style().set_property("color", view.status_color);
        }

        self.toggle.set_text_content(Some(view.toggle_label));
        let classes = self.toggle.class_list();
        let _ = classes.toggle_with_force("inactive", view.toggle_inactive);
        let _ = if view.toggle_disabled {
            self.toggle.set_attribute("disabled", "")
        } else {
            self.toggle.remove_attribute("disabled")
        };
    }
}

type SharedPanel = Rc<RefCell<Option<SettingsPanel<BrowserStore>>>>;

fn on_toggle(panel: SharedPanel, view: Rc<PopupView>) {
    // A toggle already in flight owns the panel.
    let Some(mut current) = panel.borrow_mut().take() else {
        return;
    };

    spawn_local(async move {
        match current.toggle(&BrowserTabs).await {
            Ok(next) => view.render(&next),
            Err(e) => {
                tracing::warn!(target: "begone::popup", error = %e, "toggle failed");
                view.render(&current.view());
            }
        }
        *panel.borrow_mut() = Some(current);
    });
}

pub async fn run() -> Result<(), Error> {
    let store = BrowserStore::local()?;
    let settings = Settings::load(&store).await;
    logging::init(settings.debug_logging);

    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| Error::Dom("no document".to_string()))?;
    let view = Rc::new(PopupView::from_document(&document)?);

    let channel = match query_active_tabs().await {
        Ok(tabs) => match tabs.first() {
            Some(tab) => lookup_channel(tab, &settings).await,
            None => None,
        },
        Err(e) => {
            tracing::warn!(target: "begone::popup", error = %e, "could not query the active tab");
            None
        }
    };
    tracing::debug!(target: "begone::popup", ?channel, "popup opened");

    let current = SettingsPanel::open(AllowlistStore::new(store), channel).await;
    view.render(&current.view());
    let panel: SharedPanel = Rc::new(RefCell::new(Some(current)));

    let on_click = {
        let view = view.clone();
        Closure::<dyn FnMut()>::new(move || on_toggle(panel.clone(), view.clone()))
    };
    view.toggle
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .map_err(|e| Error::Dom(js_error(e)))?;
    // The popup document is torn down on close.
    on_click.forget();

    Ok(())
}
