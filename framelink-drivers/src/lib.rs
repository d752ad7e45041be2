//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in framelink-core:
//!
//! - Display controllers (SSD1329 4-bit grayscale OLED)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod display;
