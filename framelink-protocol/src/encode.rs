//! Sender-side frame encoding.
//!
//! The host converts 8-bit grayscale images into the packed 4-bit wire
//! format. Only the high nibble of each sample survives; two samples share
//! one byte with the left pixel in the high nibble.

use core::iter::{self, Chain, Once, Repeat, Take};

use crate::wire::{FrameGeometry, SENTINEL, SENTINEL_SUBSTITUTE};

/// Errors that can occur while encoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Fewer luma samples than pixels in the geometry
    ShortInput,
    /// Only 4 bits/pixel with byte-aligned rows can be packed
    UnsupportedGeometry,
    /// Output buffer cannot hold sentinel plus frame
    BufferTooSmall,
}

/// Pack two 8-bit luma samples into one wire byte
///
/// A result equal to the sentinel is replaced with [`SENTINEL_SUBSTITUTE`],
/// so packed pixel data never resynchronizes the receiver.
#[inline]
pub const fn pack_pixels(left: u8, right: u8) -> u8 {
    let byte = (left & 0xF0) | (right >> 4);
    if byte == SENTINEL {
        SENTINEL_SUBSTITUTE
    } else {
        byte
    }
}

/// Iterator over the wire bytes of one frame
///
/// Yields the sentinel followed by `geometry.frame_len()` packed bytes.
#[derive(Debug, Clone)]
pub struct FrameEncoder<'a> {
    luma: &'a [u8],
    geometry: FrameGeometry,
    /// 0 before the sentinel, then 1 + index of the next payload byte
    position: usize,
}

impl<'a> FrameEncoder<'a> {
    /// Create an encoder over a row-major 8-bit luma image
    pub fn new(luma: &'a [u8], geometry: FrameGeometry) -> Result<Self, EncodeError> {
        if geometry.bits_per_pixel != 4 || !geometry.is_valid() {
            return Err(EncodeError::UnsupportedGeometry);
        }
        if luma.len() < geometry.pixel_count() {
            return Err(EncodeError::ShortInput);
        }

        Ok(Self {
            luma,
            geometry,
            position: 0,
        })
    }

    /// Total bytes this encoder produces (sentinel included)
    pub fn wire_len(&self) -> usize {
        self.geometry.frame_len() + 1
    }
}

impl Iterator for FrameEncoder<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let byte = match self.position {
            0 => SENTINEL,
            n if n <= self.geometry.frame_len() => {
                let pixel = (n - 1) * 2;
                pack_pixels(self.luma[pixel], self.luma[pixel + 1])
            }
            _ => return None,
        };
        self.position += 1;
        Some(byte)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.wire_len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameEncoder<'_> {}

/// Encode one frame (sentinel included) into `out`
///
/// Returns the number of bytes written.
pub fn encode_frame(
    luma: &[u8],
    geometry: FrameGeometry,
    out: &mut [u8],
) -> Result<usize, EncodeError> {
    let encoder = FrameEncoder::new(luma, geometry)?;
    let len = encoder.wire_len();
    if out.len() < len {
        return Err(EncodeError::BufferTooSmall);
    }

    for (slot, byte) in out.iter_mut().zip(encoder) {
        *slot = byte;
    }
    Ok(len)
}

/// Wire bytes of an all-black frame
///
/// Sent by the host on shutdown so the panel does not keep the last image.
pub fn blank_frame(geometry: FrameGeometry) -> Chain<Once<u8>, Take<Repeat<u8>>> {
    iter::once(SENTINEL).chain(iter::repeat(0).take(geometry.frame_len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::RIT128X96X4;
    use proptest::prelude::*;

    #[test]
    fn test_pack_pixels() {
        assert_eq!(pack_pixels(0x00, 0x00), 0x00);
        assert_eq!(pack_pixels(0xAB, 0xCD), 0xAC);
        assert_eq!(pack_pixels(0x10, 0xF0), 0x1F);
    }

    #[test]
    fn test_pack_pixels_avoids_sentinel() {
        assert_eq!(pack_pixels(0xFF, 0xFF), SENTINEL_SUBSTITUTE);
        assert_eq!(pack_pixels(0xF0, 0xF7), SENTINEL_SUBSTITUTE);
        assert_eq!(pack_pixels(0xF0, 0xE0), 0xFE);
    }

    #[test]
    fn test_encoder_starts_with_sentinel() {
        let luma = [0x80u8; 128 * 96];
        let mut encoder = FrameEncoder::new(&luma, RIT128X96X4).unwrap();

        assert_eq!(encoder.len(), 6145);
        assert_eq!(encoder.next(), Some(SENTINEL));
        assert_eq!(encoder.next(), Some(0x88));
        assert_eq!(encoder.count(), 6143);
    }

    #[test]
    fn test_encoder_rejects_short_input() {
        let luma = [0u8; 100];
        let result = FrameEncoder::new(&luma, RIT128X96X4);
        assert_eq!(result.err(), Some(EncodeError::ShortInput));
    }

    #[test]
    fn test_encoder_rejects_other_depths() {
        let luma = [0u8; 64];
        let geometry = FrameGeometry::new(8, 8, 8);
        assert_eq!(
            FrameEncoder::new(&luma, geometry).err(),
            Some(EncodeError::UnsupportedGeometry)
        );
    }

    #[test]
    fn test_encode_frame_into_slice() {
        let geometry = FrameGeometry::new(4, 2, 4);
        let luma = [0x00, 0x10, 0x20, 0x30, 0x40, 0x50, 0xFF, 0xFF];
        let mut out = [0u8; 8];

        let len = encode_frame(&luma, geometry, &mut out).unwrap();

        assert_eq!(len, 5);
        assert_eq!(&out[..len], &[SENTINEL, 0x01, 0x23, 0x45, SENTINEL_SUBSTITUTE]);
    }

    #[test]
    fn test_encode_frame_buffer_too_small() {
        let geometry = FrameGeometry::new(4, 2, 4);
        let luma = [0u8; 8];
        let mut out = [0u8; 4];
        assert_eq!(
            encode_frame(&luma, geometry, &mut out),
            Err(EncodeError::BufferTooSmall)
        );
    }

    #[test]
    fn test_blank_frame() {
        let mut bytes = blank_frame(RIT128X96X4);
        assert_eq!(bytes.next(), Some(SENTINEL));
        assert!(bytes.clone().all(|b| b == 0));
        assert_eq!(bytes.count(), 6144);
    }

    proptest! {
        #[test]
        fn prop_payload_never_contains_sentinel(luma in proptest::collection::vec(any::<u8>(), 32)) {
            let geometry = FrameGeometry::new(8, 4, 4);
            let encoder = FrameEncoder::new(&luma, geometry).unwrap();
            let payload: Vec<u8> = encoder.skip(1).collect();

            prop_assert_eq!(payload.len(), 16);
            prop_assert!(payload.iter().all(|&b| b != SENTINEL));
        }

        #[test]
        fn prop_nibbles_follow_luma(left in any::<u8>(), right in any::<u8>()) {
            let byte = pack_pixels(left, right);
            if left >> 4 == 0xF && right >> 4 == 0xF {
                prop_assert_eq!(byte, SENTINEL_SUBSTITUTE);
            } else {
                prop_assert_eq!(byte >> 4, left >> 4);
                prop_assert_eq!(byte & 0x0F, right >> 4);
            }
        }
    }
}
