//! Pointer → object identity.
//!
//! The displayed canvas may be scaled relative to the raster's native
//! resolution, so pointer coordinates are mapped into raster pixels before
//! sampling. Sampling always reads the [`SourceBuffer`], never the overlay.

use crate::error::PickerError;
use crate::raster::codec::{self, PackedColorId, BACKGROUND_ID};
use crate::raster::source::SourceBuffer;
use crate::selection::registry::ObjectRegistry;

/// Mapping from the rendered element's size to the raster's size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub display_width: f64,
    pub display_height: f64,
    pub buffer_width: usize,
    pub buffer_height: usize,
}

impl ViewTransform {
    pub fn new(
        display_width: f64,
        display_height: f64,
        buffer_width: usize,
        buffer_height: usize,
    ) -> Self {
        Self {
            display_width,
            display_height,
            buffer_width,
            buffer_height,
        }
    }

    /// 1:1 mapping for a canvas drawn at native resolution.
    pub fn identity(width: usize, height: usize) -> Self {
        Self::new(width as f64, height as f64, width, height)
    }

    /// Map a displayed coordinate into raster pixels.
    ///
    /// Returns `None` for coordinates outside the element or a degenerate
    /// element size.
    pub fn to_buffer(&self, px: f64, py: f64) -> Option<(i64, i64)> {
        if !(self.display_width > 0.0 && self.display_height > 0.0) {
            return None;
        }
        if !px.is_finite() || !py.is_finite() || px < 0.0 || py < 0.0 {
            return None;
        }
        let x = (px * self.buffer_width as f64 / self.display_width).floor() as i64;
        let y = (py * self.buffer_height as f64 / self.display_height).floor() as i64;
        if x >= self.buffer_width as i64 || y >= self.buffer_height as i64 {
            return None;
        }
        Some((x, y))
    }
}

/// Identity under the pointer; background when off-raster.
pub fn locate(source: &SourceBuffer, px: f64, py: f64, transform: &ViewTransform) -> PackedColorId {
    match transform.to_buffer(px, py) {
        Some((x, y)) => source.id_at(x, y),
        None => BACKGROUND_ID,
    }
}

/// Registered object under the pointer.
///
/// Background and unregistered ids (anti-aliasing noise, stale manifests)
/// both resolve to `None`.
pub fn resolve(
    source: &SourceBuffer,
    registry: &ObjectRegistry,
    px: f64,
    py: f64,
    transform: &ViewTransform,
) -> Option<PackedColorId> {
    let id = locate(source, px, py, transform);
    if codec::is_background(id) {
        return None;
    }
    if !registry.contains(id) {
        log::debug!("{}", PickerError::UnregisteredSample(id));
        return None;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::registry::Manifest;
    use ndarray::Array3;
    use std::collections::BTreeSet;

    /// 4x4 raster, left half id 1, right half id 2.
    fn halves() -> SourceBuffer {
        let mut img = Array3::<u8>::zeros((4, 4, 4));
        for y in 0..4 {
            for x in 0..4 {
                img[[y, x, 0]] = if x < 2 { 1 } else { 2 };
                img[[y, x, 3]] = 255;
            }
        }
        SourceBuffer::from_array(img)
    }

    #[test]
    fn test_identity_transform() {
        let src = halves();
        let t = ViewTransform::identity(4, 4);
        assert_eq!(locate(&src, 0.5, 0.5, &t), 1);
        assert_eq!(locate(&src, 3.9, 3.9, &t), 2);
        assert_eq!(locate(&src, 4.0, 0.0, &t), BACKGROUND_ID);
        assert_eq!(locate(&src, -0.1, 0.0, &t), BACKGROUND_ID);
    }

    #[test]
    fn test_scaled_display() {
        let src = halves();
        // Canvas drawn at 400x400 for a 4x4 raster
        let t = ViewTransform::new(400.0, 400.0, 4, 4);
        assert_eq!(t.to_buffer(150.0, 399.0), Some((1, 3)));
        assert_eq!(locate(&src, 199.0, 10.0, &t), 1);
        assert_eq!(locate(&src, 200.0, 10.0, &t), 2);
    }

    #[test]
    fn test_degenerate_display() {
        let t = ViewTransform::new(0.0, 10.0, 4, 4);
        assert_eq!(t.to_buffer(1.0, 1.0), None);
        let t = ViewTransform::identity(4, 4);
        assert_eq!(t.to_buffer(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_resolve_only_returns_registered_ids() {
        let src = halves();
        let manifest: Manifest = [(1, "Cube".to_string())].into_iter().collect();
        let registry = ObjectRegistry::build(&manifest, &BTreeSet::new());
        let t = ViewTransform::identity(4, 4);

        for y in 0..8 {
            for x in 0..8 {
                let (px, py) = (x as f64 * 0.6, y as f64 * 0.6);
                let located = locate(&src, px, py, &t);
                assert!(located == BACKGROUND_ID || src.object_ids().contains(&located));
                if let Some(id) = resolve(&src, &registry, px, py, &t) {
                    assert!(registry.contains(id));
                }
            }
        }
        assert_eq!(resolve(&src, &registry, 3.0, 0.0, &t), None);
        assert_eq!(resolve(&src, &registry, 0.0, 0.0, &t), Some(1));
    }
}
