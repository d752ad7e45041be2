//! Frame assembly and hand-off
//!
//! A frame buffer is owned by exactly one side at a time. Ownership moves
//! as a `&mut` reference: the receiver holds the buffer it writes into,
//! the exchange holds published and spare buffers, and the pump holds a
//! [`FrameLease`] while it draws.

pub mod buffer;
pub mod exchange;
pub mod receiver;

pub use buffer::{BufferFull, FrameBuffer, Push};
pub use exchange::{ExchangeStats, FrameExchange, FrameLease, MAX_FRAMES};
pub use receiver::{FrameReceiver, ReceiverStats, RxEvent};
