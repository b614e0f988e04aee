//! Object border detection on the id-buffer.
//!
//! A pixel is on its object's border when any neighbor within `width`
//! pixels along one of the four cardinal directions carries a different id.
//! Neighbors outside the raster are skipped, so an object touching the
//! raster edge is not bordered there. With `width = 2` the highlight is two
//! pixels thick.

use ndarray::{Array2, ArrayView2};

use crate::raster::codec::PackedColorId;

const DIRECTIONS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Check whether `(x, y)` lies within `width` pixels of a different id.
#[inline]
pub fn is_boundary(ids: &ArrayView2<PackedColorId>, x: usize, y: usize, width: usize) -> bool {
    let (height, raster_width) = ids.dim();
    let id = ids[[y, x]];

    for &(dx, dy) in &DIRECTIONS {
        for step in 1..=width as i64 {
            let nx = x as i64 + dx * step;
            let ny = y as i64 + dy * step;
            if nx < 0 || ny < 0 || nx >= raster_width as i64 || ny >= height as i64 {
                break;
            }
            if ids[[ny as usize, nx as usize]] != id {
                return true;
            }
        }
    }
    false
}

/// Border mask of one object (255 = border pixel, 0 = anything else).
pub fn border_mask(ids: ArrayView2<PackedColorId>, target: PackedColorId, width: usize) -> Array2<u8> {
    let (height, raster_width) = ids.dim();
    let mut mask = Array2::<u8>::zeros((height, raster_width));

    for y in 0..height {
        for x in 0..raster_width {
            if ids[[y, x]] == target && is_boundary(&ids, x, y, width) {
                mask[[y, x]] = 255;
            }
        }
    }

    mask
}
