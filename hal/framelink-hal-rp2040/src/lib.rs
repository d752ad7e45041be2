//! RP2040-specific HAL for the Framelink firmware
//!
//! This crate provides RP2040 implementations of the shared
//! `framelink-hal` traits on top of embassy-rp drivers:
//!
//! - Serial link over a buffered UART receiver
//! - Display bus over a blocking, transmit-only SPI
//! - Data/command select output pin

#![no_std]

pub mod gpio;
pub mod spi;
pub mod uart;

pub use gpio::Rp2040Pin;
pub use spi::{spi_config, BusError, Rp2040Bus};
pub use uart::{embassy_config, LinkError, Rp2040Link};
