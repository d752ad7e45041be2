//! Sentinel-driven frame receive state machine.
//!
//! Runs in the receive context, one byte at a time, strictly in arrival
//! order. Every frame on the wire is preceded by the sentinel:
//!
//! ```text
//!            sentinel                   N-th byte
//! Hunting ─────────────► Assembling ──────────────► publish ─► Hunting
//!    ▲                     │   ▲  sentinel (restart)
//!    │   line error        │   │
//!    └─────────────────────┘   └─ (partial frame dropped)
//! ```
//!
//! While hunting, non-sentinel bytes are discarded. This covers bytes that
//! follow a complete frame as well as garbage after a line error, so the
//! receiver can never write past the end of a buffer.

use core::mem;

use framelink_hal::{LineStatus, SerialLink};
use framelink_protocol::is_sentinel;

use super::buffer::{FrameBuffer, Push};
use super::exchange::FrameExchange;

/// Result of feeding one byte or line condition to the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// Byte stored in the in-flight frame
    Stored,
    /// Byte completed the frame and it was published
    Completed,
    /// Sentinel seen; assembly restarted at offset 0
    Resynced,
    /// Sentinel seen but every buffer is held elsewhere
    Starved,
    /// Byte dropped while waiting for a sentinel
    Discarded,
    /// Line condition; in-flight frame dropped
    LineError(LineStatus),
}

/// Receive counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiverStats {
    /// Bytes taken from the link, sentinels included
    pub bytes: u32,
    /// Frames published
    pub frames: u32,
    /// Partial frames dropped by a sentinel or line error
    pub truncated: u32,
    /// Non-sentinel bytes dropped while hunting
    pub discarded: u32,
    /// Sentinels that found no free buffer
    pub starved: u32,
    /// Line conditions reported by the link
    pub line_errors: u32,
}

enum Stage<'a, const N: usize> {
    Assembling(&'a mut FrameBuffer<N>),
    Hunting(Option<&'a mut FrameBuffer<N>>),
}

/// Frame assembler feeding a [`FrameExchange`]
pub struct FrameReceiver<'a, const N: usize> {
    exchange: &'a FrameExchange<'a, N>,
    stage: Stage<'a, N>,
    stats: ReceiverStats,
}

impl<'a, const N: usize> FrameReceiver<'a, N> {
    /// Create a receiver drawing buffers from `exchange`
    ///
    /// If a buffer is available the receiver starts assembling at offset
    /// 0 straight away, so a stream that begins mid-frame without a
    /// sentinel is still accepted once.
    pub fn new(exchange: &'a FrameExchange<'a, N>) -> Self {
        let stage = match exchange.reclaim() {
            Some(frame) => {
                frame.restart();
                Stage::Assembling(frame)
            }
            None => Stage::Hunting(None),
        };

        Self {
            exchange,
            stage,
            stats: ReceiverStats::default(),
        }
    }

    /// Offset the next byte will be written to
    ///
    /// Zero while hunting.
    pub fn cursor(&self) -> usize {
        match &self.stage {
            Stage::Assembling(frame) => frame.cursor(),
            Stage::Hunting(_) => 0,
        }
    }

    /// Check if a frame is being assembled
    pub fn is_synced(&self) -> bool {
        matches!(self.stage, Stage::Assembling(_))
    }

    /// Receive counters
    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Feed one received byte
    pub fn feed(&mut self, byte: u8) -> RxEvent {
        self.stats.bytes = self.stats.bytes.wrapping_add(1);

        if is_sentinel(byte) {
            return self.resync();
        }

        let pushed = match &mut self.stage {
            Stage::Assembling(frame) => frame.push(byte),
            Stage::Hunting(_) => {
                self.stats.discarded = self.stats.discarded.wrapping_add(1);
                return RxEvent::Discarded;
            }
        };

        match pushed {
            Ok(Push::Stored) => RxEvent::Stored,
            Ok(Push::Completed) => {
                if let Stage::Assembling(frame) = mem::replace(&mut self.stage, Stage::Hunting(None)) {
                    self.stage = Stage::Hunting(self.exchange.publish(frame));
                }
                self.stats.frames = self.stats.frames.wrapping_add(1);
                RxEvent::Completed
            }
            Err(_) => {
                // Full buffer left in assembly; wait for the next sentinel
                self.stop_assembling();
                self.stats.discarded = self.stats.discarded.wrapping_add(1);
                RxEvent::Discarded
            }
        }
    }

    /// Report a line condition from the link
    ///
    /// The in-flight frame is dropped and the receiver hunts for the next
    /// sentinel. The buffer is kept for reuse.
    pub fn line_error(&mut self, status: LineStatus) -> RxEvent {
        self.stats.line_errors = self.stats.line_errors.wrapping_add(1);
        self.stop_assembling();
        RxEvent::LineError(status)
    }

    /// Drain every pending byte from `link`
    ///
    /// Returns the number of frames published.
    pub fn service<L: SerialLink>(&mut self, link: &mut L) -> usize {
        let mut published = 0;

        loop {
            match link.try_read_byte() {
                Ok(Some(byte)) => {
                    if self.feed(byte) == RxEvent::Completed {
                        published += 1;
                    }
                }
                Ok(None) => break,
                Err(status) => {
                    self.line_error(status);
                }
            }
        }

        published
    }

    fn resync(&mut self) -> RxEvent {
        let frame = match mem::replace(&mut self.stage, Stage::Hunting(None)) {
            Stage::Assembling(frame) => {
                if frame.cursor() > 0 {
                    self.stats.truncated = self.stats.truncated.wrapping_add(1);
                }
                Some(frame)
            }
            Stage::Hunting(held) => held.or_else(|| self.exchange.reclaim()),
        };

        match frame {
            Some(frame) => {
                frame.restart();
                self.stage = Stage::Assembling(frame);
                RxEvent::Resynced
            }
            None => {
                self.stats.starved = self.stats.starved.wrapping_add(1);
                RxEvent::Starved
            }
        }
    }

    fn stop_assembling(&mut self) {
        if let Stage::Assembling(frame) = mem::replace(&mut self.stage, Stage::Hunting(None)) {
            if frame.cursor() > 0 {
                self.stats.truncated = self.stats.truncated.wrapping_add(1);
            }
            frame.restart();
            self.stage = Stage::Hunting(Some(frame));
        }
    }
}
