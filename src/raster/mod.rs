//! Raster primitives shared by the picker.
//!
//! - **codec**: RGB ↔ object identity packing
//! - **source**: the immutable pick raster and its decoded id-buffer

pub mod codec;
pub mod source;

pub use codec::{decode, encode, PackedColorId, BACKGROUND_ID};
pub use source::SourceBuffer;
