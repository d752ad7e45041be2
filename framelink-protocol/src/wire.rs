//! Wire constants and frame geometry.
//!
//! - SENTINEL (1 byte): 0xFF, restart the frame at offset 0
//! - PAYLOAD (fixed): `width * height * bits_per_pixel / 8` bytes, two
//!   4-bit pixels per byte with the left pixel in the high nibble

/// Frame resynchronization byte
pub const SENTINEL: u8 = 0xFF;

/// Value a sender emits in place of a packed pixel byte equal to [`SENTINEL`]
///
/// Both nibbles drop by one gray level, which is not visible on the panel.
pub const SENTINEL_SUBSTITUTE: u8 = 0xEE;

/// Geometry of the 128x96, 4 bits/pixel RIT P14201 panel
pub const RIT128X96X4: FrameGeometry = FrameGeometry::new(128, 96, 4);

/// Check if a received byte is the frame sentinel
#[inline]
pub const fn is_sentinel(byte: u8) -> bool {
    byte == SENTINEL
}

/// Display geometry that fixes the frame length on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameGeometry {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Bits per pixel (1, 2, 4 or 8)
    pub bits_per_pixel: u8,
}

impl FrameGeometry {
    /// Create a geometry
    pub const fn new(width: u16, height: u16, bits_per_pixel: u8) -> Self {
        Self {
            width,
            height,
            bits_per_pixel,
        }
    }

    /// Frame length in bytes
    pub const fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bits_per_pixel as usize / 8
    }

    /// Bytes per pixel row
    pub const fn row_len(&self) -> usize {
        self.width as usize * self.bits_per_pixel as usize / 8
    }

    /// Number of pixels in one frame
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check that every row ends on a byte boundary and the depth is supported
    pub const fn is_valid(&self) -> bool {
        let depth_ok = matches!(self.bits_per_pixel, 1 | 2 | 4 | 8);
        let aligned = (self.width as usize * self.bits_per_pixel as usize) % 8 == 0;
        depth_ok && aligned && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rit_frame_len() {
        assert_eq!(RIT128X96X4.frame_len(), 6144);
        assert_eq!(RIT128X96X4.row_len(), 64);
        assert_eq!(RIT128X96X4.pixel_count(), 128 * 96);
        assert!(RIT128X96X4.is_valid());
    }

    #[test]
    fn test_unaligned_geometry_rejected() {
        // 3 pixels at 4 bpp leaves half a byte per row
        assert!(!FrameGeometry::new(3, 8, 4).is_valid());
        assert!(!FrameGeometry::new(8, 8, 3).is_valid());
        assert!(!FrameGeometry::new(0, 8, 8).is_valid());
        assert!(FrameGeometry::new(2, 1, 4).is_valid());
    }

    #[test]
    fn test_sentinel() {
        assert!(is_sentinel(0xFF));
        assert!(!is_sentinel(SENTINEL_SUBSTITUTE));
        assert!(!is_sentinel(0x00));
    }
}
