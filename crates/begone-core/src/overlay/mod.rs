pub mod config;
pub mod controller;
pub mod drag;
pub mod geometry;
pub mod host;

pub use config::*;
pub use controller::*;
pub use drag::*;
pub use geometry::{Point, Rect};
pub use host::*;
