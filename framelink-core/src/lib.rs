//! Board-agnostic core of the frame streaming pipeline
//!
//! This crate contains everything between the serial link and the
//! display driver that does not depend on a specific chip:
//!
//! - Frame buffers and the sentinel-driven receive state machine
//! - The producer/consumer frame exchange (ownership hand-off)
//! - The display bus transfer gate
//! - The display pump that drains completed frames
//! - Pipeline configuration and validation
//!
//! # Contexts
//!
//! ```text
//!   receive context (preemptive)          main context (cooperative)
//! ┌──────────────────────────────┐     ┌──────────────────────────────┐
//! │ SerialLink → FrameReceiver   │     │ DisplayPump → Display        │
//! │        │ publish             │     │   ▲ take_ready    │ release  │
//! └────────┼─────────────────────┘     └───┼───────────────┼──────────┘
//!          ▼                               │               ▼
//!        ┌──────────────────── FrameExchange ────────────────────┐
//!        │  ready slot                 spare buffers             │
//!        └───────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod frame;
pub mod gate;
pub mod pump;
pub mod traits;

pub use config::{ConfigError, PipelineConfig};
pub use frame::{FrameBuffer, FrameExchange, FrameLease, FrameReceiver, RxEvent};
pub use gate::{GateState, GatedBus, TransferGate};
pub use pump::DisplayPump;
pub use traits::{Display, DisplayError};
