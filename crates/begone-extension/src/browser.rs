//! Thin access to the WebExtension API from Rust.
//!
//! Firefox exposes `browser`, Chromium exposes `chrome`; both return promises from
//! the calls used here when no callback is passed.

use begone_core::Error;
use js_sys::{Array, Function, JSON, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// The extension namespace object.
pub fn namespace() -> Result<JsValue, Error> {
    let global = js_sys::global();
    for name in ["browser", "chrome"] {
        if let Ok(ns) = Reflect::get(&global, &JsValue::from_str(name)) {
            if !ns.is_undefined() && !ns.is_null() {
                return Ok(ns);
            }
        }
    }
    Err(Error::Dom("extension API is not available".to_string()))
}

/// Walk `segments` down from the namespace, e.g. `["storage", "local"]`.
pub fn api(segments: &[&str]) -> Result<JsValue, Error> {
    let mut current = namespace()?;
    for segment in segments {
        current = Reflect::get(&current, &JsValue::from_str(segment))
            .map_err(|e| Error::Dom(js_error(e)))?;
        if current.is_undefined() {
            let path = segments.join(".");
            return Err(Error::Dom(format!("extension API {path} is not available")));
        }
    }
    Ok(current)
}

/// Call `target[method](...args)` and await the result when it is a promise.
pub async fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;
    let args: Array = args.iter().collect();
    let result = function.apply(target, &args)?;

    match result.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

/// Convert a structured-clone-able JS value into JSON.
pub fn to_json(value: &JsValue) -> Result<serde_json::Value, Error> {
    if value.is_undefined() {
        return Ok(serde_json::Value::Null);
    }
    let text = JSON::stringify(value)
        .map_err(|e| Error::Dom(js_error(e)))?
        .as_string()
        .unwrap_or_default();
    if text.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

pub fn from_json(value: &serde_json::Value) -> Result<JsValue, Error> {
    JSON::parse(&serde_json::to_string(value)?).map_err(|e| Error::Dom(js_error(e)))
}

/// Best-effort text for a thrown JS value.
pub fn js_error(value: JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Ok(message) = Reflect::get(&value, &JsValue::from_str("message")) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    format!("{value:?}")
}
