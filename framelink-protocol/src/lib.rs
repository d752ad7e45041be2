//! Framelink pixel stream format
//!
//! This crate defines the wire format between the host sender and the
//! display board. The format is deliberately minimal:
//!
//! ```text
//! ┌──────┬───────────────────────────────────────────┬──────┬─────
//! │ 0xFF │ width*height*bpp/8 packed pixel bytes      │ 0xFF │ ...
//! └──────┴───────────────────────────────────────────┴──────┴─────
//! ```
//!
//! There is no length field, no checksum and no acknowledgement. The
//! sentinel byte `0xFF` never appears in pixel data; a receiver that sees
//! it discards whatever it has accumulated and starts a new frame at
//! offset 0.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod encode;
pub mod wire;

pub use encode::{blank_frame, encode_frame, pack_pixels, EncodeError, FrameEncoder};
pub use wire::{is_sentinel, FrameGeometry, RIT128X96X4, SENTINEL, SENTINEL_SUBSTITUTE};
