//! Color-channel identity codec.
//!
//! Pick rasters encode each printable object as a flat RGB color. The object
//! id is the little-endian packing of the three color channels:
//!
//! ```text
//! id = r | (g << 8) | (b << 16)        (0x00BBGGRR)
//! ```
//!
//! Alpha never takes part in the identity, so two pixels with the same RGB
//! and different alpha decode to the same id. Black (`0`) is the background.

/// Object identity packed from a pixel's RGB channels.
pub type PackedColorId = u32;

/// Reserved id for "no object".
pub const BACKGROUND_ID: PackedColorId = 0;

/// Largest id the 8-bit-per-channel encoding can express.
pub const MAX_ID: PackedColorId = 0x00FF_FFFF;

/// Pack RGB channels into an identity.
#[inline]
pub const fn encode(r: u8, g: u8, b: u8) -> PackedColorId {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
}

/// Decode the identity of a raw RGBA pixel. Alpha is ignored.
#[inline]
pub const fn decode(pixel: [u8; 4]) -> PackedColorId {
    encode(pixel[0], pixel[1], pixel[2])
}

/// Recover the wire color `[r, g, b]` of an identity.
///
/// Bits above [`MAX_ID`] are dropped.
#[inline]
pub const fn unpack(id: PackedColorId) -> [u8; 3] {
    [
        (id & 0xFF) as u8,
        ((id >> 8) & 0xFF) as u8,
        ((id >> 16) & 0xFF) as u8,
    ]
}

#[inline]
pub const fn is_background(id: PackedColorId) -> bool {
    id == BACKGROUND_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ignores_alpha() {
        for &(r, g, b) in &[(0u8, 0u8, 0u8), (255, 0, 0), (12, 34, 56), (255, 255, 255)] {
            let ids: Vec<_> = [0u8, 1, 128, 255]
                .iter()
                .map(|&a| decode([r, g, b, a]))
                .collect();
            assert!(ids.iter().all(|&id| id == ids[0]));
        }
    }

    #[test]
    fn test_channel_order_matches_identify_id() {
        // identify_id 394 = 0x00018A -> r=0x8A, g=0x01, b=0x00
        assert_eq!(encode(0x8A, 0x01, 0x00), 394);
        assert_eq!(encode(0, 0, 1), 1 << 16);
        assert_eq!(unpack(394), [0x8A, 0x01, 0x00]);
    }

    #[test]
    fn test_black_is_background() {
        assert!(is_background(decode([0, 0, 0, 255])));
        assert!(!is_background(decode([1, 0, 0, 0])));
        assert_eq!(encode(255, 255, 255), MAX_ID);
    }

    #[test]
    fn test_unpack_inverts_encode() {
        for id in [1u32, 123, 0x00AB_CDEF, MAX_ID] {
            let [r, g, b] = unpack(id);
            assert_eq!(encode(r, g, b), id);
        }
    }
}
