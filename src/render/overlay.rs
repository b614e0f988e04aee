//! Selection overlay rendering.
//!
//! The overlay is recomputed from scratch for every state change: a pure
//! function of the pick raster, the registry and the hovered object. Per
//! pixel, in priority order:
//!
//! 1. hovered object: border pixels get the highlight color, interior
//!    pixels keep the color rule 2 or 3 gives them
//! 2. pending exclusion: excluded color
//! 3. any other object: includable color
//! 4. background: source pixel passed through untouched
//!
//! Rows are painted in parallel. Each row only reads the immutable inputs
//! and writes its own slice, so the result never depends on scheduling.

use ndarray::{Array3, ArrayView3, ArrayViewMut2, Axis};
use rayon::prelude::*;

use crate::config::{Palette, PickerConfig, DEFAULT_BORDER_WIDTH};
use crate::raster::codec::{self, PackedColorId};
use crate::raster::source::SourceBuffer;
use crate::render::border::is_boundary;
use crate::selection::registry::ObjectRegistry;

/// Colors plus highlight thickness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub palette: Palette,
    pub border_width: usize,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            border_width: DEFAULT_BORDER_WIDTH,
        }
    }
}

impl From<&PickerConfig> for OverlayStyle {
    fn from(config: &PickerConfig) -> Self {
        Self {
            palette: config.palette,
            border_width: config.border_width,
        }
    }
}

/// Recolored `(height, width, 4)` RGBA raster shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    pixels: Array3<u8>,
}

impl DisplayBuffer {
    /// Fully transparent buffer.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            pixels: Array3::zeros((height, width, 4)),
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        [
            self.pixels[[y, x, 0]],
            self.pixels[[y, x, 1]],
            self.pixels[[y, x, 2]],
            self.pixels[[y, x, 3]],
        ]
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Flat row-major RGBA bytes, as a canvas `ImageData` expects.
    pub fn to_rgba_vec(&self) -> Vec<u8> {
        match self.pixels.as_slice() {
            Some(flat) => flat.to_vec(),
            None => self.pixels.iter().copied().collect(),
        }
    }

    pub fn into_array(self) -> Array3<u8> {
        self.pixels
    }
}

/// Render the overlay into a new buffer.
pub fn render(
    source: &SourceBuffer,
    registry: &ObjectRegistry,
    hover: Option<PackedColorId>,
    style: &OverlayStyle,
) -> DisplayBuffer {
    let mut out = DisplayBuffer::blank(source.width(), source.height());
    render_into(&mut out, source, registry, hover, style);
    out
}

/// Render the overlay, reusing `out`'s allocation when the size matches.
pub fn render_into(
    out: &mut DisplayBuffer,
    source: &SourceBuffer,
    registry: &ObjectRegistry,
    hover: Option<PackedColorId>,
    style: &OverlayStyle,
) {
    let (width, height) = (source.width(), source.height());
    if out.width() != width || out.height() != height {
        *out = DisplayBuffer::blank(width, height);
    }

    // Hovering the background highlights nothing.
    let hover = hover.filter(|&id| !codec::is_background(id));
    let ids = source.ids();
    let pixels = source.pixels();
    let palette = &style.palette;

    out.pixels
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            for x in 0..width {
                let id = ids[[y, x]];
                let color = if codec::is_background(id) {
                    [
                        pixels[[y, x, 0]],
                        pixels[[y, x, 1]],
                        pixels[[y, x, 2]],
                        pixels[[y, x, 3]],
                    ]
                } else if hover == Some(id) && is_boundary(&ids, x, y, style.border_width) {
                    palette.highlight
                } else if registry.is_pending(id) {
                    palette.excluded
                } else {
                    palette.includable
                };
                write_pixel(&mut row, x, color);
            }
        });
}

#[inline]
fn write_pixel(row: &mut ArrayViewMut2<u8>, x: usize, color: [u8; 4]) {
    for (c, value) in color.into_iter().enumerate() {
        row[[x, c]] = value;
    }
}
