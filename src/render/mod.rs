//! Overlay rendering.
//!
//! - **border**: cardinal-neighbor boundary detection on the id-buffer
//! - **overlay**: full-frame recoloring for selection, hover and lock state

pub mod border;
pub mod overlay;

pub use border::{border_mask, is_boundary};
pub use overlay::{render, render_into, DisplayBuffer, OverlayStyle};
