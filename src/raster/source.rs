//! Authoritative pick raster.
//!
//! The RGBA pixels are kept for pass-through rendering of the background,
//! and a parallel id-buffer is decoded from them exactly once at load time.
//! Every identity lookup goes through the id-buffer; nothing ever writes to
//! either array after construction.

use std::collections::BTreeSet;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::error::{PickerError, Result};
use crate::raster::codec::{self, PackedColorId, BACKGROUND_ID};

/// Immutable `(height, width, 4)` RGBA raster plus its decoded id-buffer.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    pixels: Array3<u8>,
    ids: Array2<PackedColorId>,
}

impl SourceBuffer {
    /// Build from a flat RGBA byte vector (row-major, 4 bytes per pixel).
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let Some(expected) = width.checked_mul(height).and_then(|n| n.checked_mul(4)) else {
            return Err(PickerError::InvalidRaster {
                width,
                height,
                expected: usize::MAX,
                actual: data.len(),
            });
        };
        if data.len() != expected {
            return Err(PickerError::InvalidRaster {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        let pixels = Array3::from_shape_vec((height, width, 4), data).map_err(|_| {
            PickerError::InvalidRaster {
                width,
                height,
                expected,
                actual: expected,
            }
        })?;
        Ok(Self::from_array(pixels))
    }

    /// Build from an `(height, width, 4)` array.
    ///
    /// Arrays with fewer than four channels are treated as opaque RGB; missing
    /// channels read as zero.
    pub fn from_array(pixels: Array3<u8>) -> Self {
        let (height, width, channels) = pixels.dim();
        let pixels = if channels == 4 {
            pixels
        } else {
            let mut rgba = Array3::<u8>::zeros((height, width, 4));
            for y in 0..height {
                for x in 0..width {
                    for c in 0..channels.min(3) {
                        rgba[[y, x, c]] = pixels[[y, x, c]];
                    }
                    rgba[[y, x, 3]] = 255;
                }
            }
            rgba
        };

        let ids = Array2::from_shape_fn((height, width), |(y, x)| {
            codec::encode(pixels[[y, x, 0]], pixels[[y, x, 1]], pixels[[y, x, 2]])
        });

        Self { pixels, ids }
    }

    /// Decode an encoded raster (PNG) and check it has the configured size.
    pub fn decode_png(bytes: &[u8], expected: (usize, usize)) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = (decoded.width() as usize, decoded.height() as usize);
        if (width, height) != expected {
            return Err(PickerError::ImageLoad(format!(
                "pick image is {}x{}, expected {}x{}",
                width, height, expected.0, expected.1
            )));
        }
        log::debug!("decoded pick image {}x{}", width, height);
        Self::from_rgba(width, height, decoded.into_raw())
    }

    pub fn width(&self) -> usize {
        self.ids.dim().1
    }

    pub fn height(&self) -> usize {
        self.ids.dim().0
    }

    /// Read-only view of the RGBA pixels.
    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Read-only view of the id-buffer, indexed `[y, x]`.
    pub fn ids(&self) -> ArrayView2<'_, PackedColorId> {
        self.ids.view()
    }

    /// Raw pixel at `(x, y)`; transparent black outside the raster.
    pub fn sample(&self, x: i64, y: i64) -> [u8; 4] {
        match self.index(x, y) {
            Some((x, y)) => [
                self.pixels[[y, x, 0]],
                self.pixels[[y, x, 1]],
                self.pixels[[y, x, 2]],
                self.pixels[[y, x, 3]],
            ],
            None => [0, 0, 0, 0],
        }
    }

    /// Identity at `(x, y)`; background outside the raster.
    pub fn id_at(&self, x: i64, y: i64) -> PackedColorId {
        match self.index(x, y) {
            Some((x, y)) => self.ids[[y, x]],
            None => BACKGROUND_ID,
        }
    }

    /// Distinct non-background ids present in the raster.
    pub fn object_ids(&self) -> BTreeSet<PackedColorId> {
        let ids: BTreeSet<_> = self
            .ids
            .iter()
            .copied()
            .filter(|&id| !codec::is_background(id))
            .collect();
        log::debug!(
            "pick image census found {} object{}",
            ids.len(),
            if ids.len() == 1 { "" } else { "s" }
        );
        ids
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width() && y < self.height() {
            Some((x, y))
        } else {
            None
        }
    }
}
