//! Asynchronous key-value storage shared by the content script and the popup.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Error;

/// Minimal view of an extension storage area.
///
/// Values are whole JSON documents; writers always replace a key's value entirely,
/// so interleaved reads never observe a partial update.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    async fn set(&self, key: &str, value: Value) -> Result<(), Error>;
}

/// Read and deserialize `key`. An absent key is `Ok(None)`.
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>, Error>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

pub async fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), Error>
where
    S: KeyValueStore,
    T: Serialize,
{
    store.set(key, serde_json::to_value(value)?).await
}
