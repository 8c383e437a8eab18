//! Content script: one [`Controller`] per page, driven by timers, DOM events and
//! popup messages.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use begone_core::{
    AllowlistStore, Controller, Error, Message, Point, Settings, fetch_channel_state,
    fetch_message_geometry,
};
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use wasm_bindgen_futures::spawn_local;
use web_sys::MouseEvent;

use crate::browser;
use crate::logging;
use crate::page::{Handlers, WebPage};
use crate::shared::{Access, run_or_defer, try_with};
use crate::storage::BrowserStore;

type SharedController = Rc<RefCell<Controller<WebPage>>>;
type WeakController = Weak<RefCell<Controller<WebPage>>>;
type SharedAllowlist = Rc<AllowlistStore<BrowserStore>>;

/// Run `f` against the controller unless it is gone or already borrowed further up
/// the stack.
fn with_controller<R>(
    weak: &WeakController,
    f: impl FnOnce(&mut Controller<WebPage>) -> R,
) -> Option<R> {
    let access = try_with(weak, f);
    if matches!(access, Access::Busy) {
        tracing::debug!(target: "begone::content", "controller busy, skipping event");
    }
    access.ran()
}

/// Pointer released. Listeners must come off even when the controller is busy, so
/// the release is deferred rather than skipped.
fn release_pointer(weak: &WeakController, allowlist: SharedAllowlist) {
    let finish = move |controller: &mut Controller<WebPage>| {
        if let Some(request) = controller.end_drag() {
            spawn_local(async move { request.commit(&allowlist).await });
        }
    };
    run_or_defer(weak, finish, |task| {
        tracing::debug!(target: "begone::content", "controller busy, deferring pointer release");
        spawn_local(async move { task() });
    });
}

fn pointer(event: &MouseEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

impl Handlers {
    fn new(weak: WeakController, allowlist: SharedAllowlist) -> Self {
        let pointer_down = {
            let weak = weak.clone();
            Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.prevent_default();
                with_controller(&weak, |c| c.begin_drag(pointer(&event)));
            })
        };

        let pointer_move = {
            let weak = weak.clone();
            Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                with_controller(&weak, |c| c.drag_to(pointer(&event)));
            })
        };

        let pointer_up = {
            let weak = weak.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                release_pointer(&weak, allowlist.clone());
            })
        };

        let resize = {
            let weak = weak.clone();
            Closure::<dyn FnMut()>::new(move || {
                with_controller(&weak, |c| c.on_resize());
            })
        };

        let watchdog = Closure::<dyn FnMut()>::new(move || {
            with_controller(&weak, |c| c.ensure_box());
        });

        Self {
            pointer_down,
            pointer_move,
            pointer_up,
            resize,
            watchdog,
        }
    }
}

/// Load the stored state for `channel` and hand it to the controller.
async fn reload(weak: WeakController, allowlist: SharedAllowlist, channel: Option<String>) {
    let state = fetch_channel_state(&allowlist, channel.as_deref()).await;
    with_controller(&weak, |c| c.apply_channel_state(channel, state));
}

/// Resolve the geometry an enabling toggle starts from, then apply the toggle.
async fn apply_message(weak: WeakController, allowlist: SharedAllowlist, message: Message) {
    let Some(channel) = with_controller(&weak, |c| c.channel().map(str::to_string)) else {
        return;
    };
    let geometry = fetch_message_geometry(&allowlist, channel.as_deref(), &message).await;
    with_controller(&weak, |c| c.handle_message(&message, geometry));
}

pub async fn run() -> Result<(), Error> {
    let store = BrowserStore::local()?;
    let settings = Settings::load(&store).await;
    logging::init(settings.debug_logging);

    let window = web_sys::window().ok_or_else(|| Error::Dom("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| Error::Dom("no document".to_string()))?;

    let allowlist: SharedAllowlist = Rc::new(AllowlistStore::new(store));
    let poll_interval = settings.channel_poll_interval();

    let controller: SharedController = Rc::new_cyclic(|weak: &WeakController| {
        let handlers = Handlers::new(weak.clone(), allowlist.clone());
        RefCell::new(Controller::new(
            WebPage::new(window.clone(), document, handlers),
            settings,
        ))
    });
    let weak = Rc::downgrade(&controller);

    let on_resize = {
        let weak = weak.clone();
        Closure::<dyn FnMut()>::new(move || {
            with_controller(&weak, |c| c.on_resize());
        })
    };
    window
        .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        .map_err(|e| Error::Dom(browser::js_error(e)))?;
    on_resize.forget();

    install_message_listener(weak.clone(), allowlist.clone())?;

    // Navigation inside the site swaps the page without reloading this script.
    let on_poll = {
        let weak = weak.clone();
        let allowlist = allowlist.clone();
        Closure::<dyn FnMut()>::new(move || {
            if let Some(channel) = with_controller(&weak, |c| c.poll_channel()).flatten() {
                spawn_local(reload(weak.clone(), allowlist.clone(), channel));
            }
        })
    };
    window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            on_poll.as_ref().unchecked_ref(),
            poll_interval.as_millis().min(i32::MAX as u128) as i32,
        )
        .map_err(|e| Error::Dom(browser::js_error(e)))?;
    on_poll.forget();

    let channel = controller.borrow().resolve_channel();
    tracing::info!(target: "begone::content", ?channel, "content script started");
    reload(weak, allowlist, channel).await;

    // Handlers hold only weak references; the page keeps the controller alive.
    std::mem::forget(controller);
    Ok(())
}

fn install_message_listener(
    weak: WeakController,
    allowlist: SharedAllowlist,
) -> Result<(), Error> {
    let callback = Closure::wrap(Box::new(
        move |message: JsValue, _sender: JsValue, _send_response: JsValue| -> JsValue {
            let parsed = browser::to_json(&message)
                .and_then(|value| serde_json::from_value::<Message>(value).map_err(Error::from));

            match parsed {
                Ok(message) => {
                    spawn_local(apply_message(weak.clone(), allowlist.clone(), message));
                }
                Err(e) => {
                    tracing::debug!(
                        target: "begone::content",
                        error = %e,
                        "ignoring unrelated message"
                    );
                }
            }
            JsValue::UNDEFINED
        },
    ) as Box<dyn FnMut(JsValue, JsValue, JsValue) -> JsValue>);

    let on_message = browser::api(&["runtime", "onMessage"])?;
    let add_listener: Function = Reflect::get(&on_message, &JsValue::from_str("addListener"))
        .map_err(|e| Error::Messaging(browser::js_error(e)))?
        .dyn_into()
        .map_err(|_| {
            Error::Messaging("runtime.onMessage.addListener is not a function".to_string())
        })?;
    add_listener
        .call1(&on_message, callback.as_ref())
        .map_err(|e| Error::Messaging(browser::js_error(e)))?;

    // Listener lives for the page lifetime.
    callback.forget();
    Ok(())
}
