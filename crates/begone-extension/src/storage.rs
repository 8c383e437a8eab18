use begone_core::{Error, KeyValueStore};
use js_sys::{Object, Reflect};
use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::browser::{self, js_error};

/// `storage.local` of the extension.
pub struct BrowserStore {
    area: JsValue,
}

impl BrowserStore {
    pub fn local() -> Result<Self, Error> {
        Ok(Self {
            area: browser::api(&["storage", "local"])?,
        })
    }
}

impl KeyValueStore for BrowserStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let items = browser::call(&self.area, "get", &[JsValue::from_str(key)])
            .await
            .map_err(|e| Error::Storage(js_error(e)))?;

        let value = Reflect::get(&items, &JsValue::from_str(key))
            .map_err(|e| Error::Storage(js_error(e)))?;
        if value.is_undefined() {
            return Ok(None);
        }
        browser::to_json(&value).map(Some)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        let items = Object::new();
        Reflect::set(&items, &JsValue::from_str(key), &browser::from_json(&value)?)
            .map_err(|e| Error::Storage(js_error(e)))?;

        browser::call(&self.area, "set", &[items.into()])
            .await
            .map_err(|e| Error::Storage(js_error(e)))?;
        Ok(())
    }
}
