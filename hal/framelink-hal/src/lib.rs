//! Framelink Hardware Abstraction Layer
//!
//! This crate defines the peripheral traits the frame pipeline consumes.
//! Chip-specific HALs implement them so the pipeline and the display
//! driver stay board-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  framelink-core / framelink-drivers     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  framelink-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ framelink-hal-│
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialLink`] - Byte-at-a-time serial receiver with line status
//! - [`spi::DisplayBus`] - Word-oriented synchronous display bus
//! - [`gpio::OutputPin`] - Digital output (display data/command select)

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod spi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use spi::{BusConfig, DisplayBus};
pub use uart::{LineStatus, SerialLink, UartConfig};
