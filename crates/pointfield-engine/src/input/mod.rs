//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code translates platform events into `InputEvent`s and folds
//! pointer motion into a `PointerState`.

pub(crate) mod platform;
mod pointer;
mod types;

pub use pointer::PointerState;
pub use types::{InputEvent, Key, KeyState};
