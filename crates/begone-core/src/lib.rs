//! Core of the Chat Begone extension: channel allow-list, overlay geometry, drag
//! handling and the watchdog-driven overlay lifecycle.
//!
//! Nothing here touches the browser directly. The page, the storage area and tab
//! messaging are traits implemented by the extension crate.

pub mod allowlist;
pub mod channel;
pub mod error;
pub mod message;
pub mod overlay;
pub mod panel;
pub mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use allowlist::*;
pub use channel::*;
pub use error::*;
pub use message::*;
pub use overlay::*;
pub use panel::*;
pub use settings::*;
pub use store::*;
