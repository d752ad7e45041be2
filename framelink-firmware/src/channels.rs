//! Shared pipeline state
//!
//! Statics shared between the receive task (interrupt executor) and the
//! display tasks (thread executor). Every item here is safe to touch
//! from either priority level.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use static_cell::ConstStaticCell;

use framelink_core::frame::ReceiverStats;
use framelink_core::pump::PumpStats;
use framelink_core::{FrameBuffer, FrameExchange, TransferGate};

use crate::device::{FRAME_COUNT, FRAME_LEN};

const EMPTY_FRAME: FrameBuffer<FRAME_LEN> = FrameBuffer::new();

/// Frame storage, handed to the exchange once at start-up
pub static FRAMES: ConstStaticCell<[FrameBuffer<FRAME_LEN>; FRAME_COUNT]> =
    ConstStaticCell::new([EMPTY_FRAME; FRAME_COUNT]);

/// Hand-off point between the receiver and the display pump
pub static FRAME_EXCHANGE: FrameExchange<'static, FRAME_LEN> = FrameExchange::new();

/// Display bus busy/idle state
pub static TRANSFER_GATE: TransferGate = TransferGate::new();

/// Latest receiver counters (updated by the receive task)
pub static RECEIVER_STATS: Signal<CriticalSectionRawMutex, ReceiverStats> = Signal::new();

/// Latest pump counters (updated by the display task)
pub static PUMP_STATS: Signal<CriticalSectionRawMutex, PumpStats> = Signal::new();
