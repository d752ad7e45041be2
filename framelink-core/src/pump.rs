//! Display pump
//!
//! Runs in the main context. Each published frame is leased from the
//! exchange, drawn across the full panel and handed back, whether or not
//! the draw succeeded. The receiver can only reuse the buffer after the
//! display has taken every byte.

use framelink_protocol::FrameGeometry;

use crate::config::ConfigError;
use crate::frame::FrameExchange;
use crate::traits::{Display, DisplayError};

/// Pump counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PumpStats {
    /// Frames drawn successfully
    pub frames_drawn: u32,
    /// Frames the display rejected
    pub draw_errors: u32,
}

/// Moves completed frames from the exchange to a display
pub struct DisplayPump<'a, D: Display, const N: usize> {
    exchange: &'a FrameExchange<'a, N>,
    display: D,
    geometry: FrameGeometry,
    stats: PumpStats,
}

impl<'a, D: Display, const N: usize> DisplayPump<'a, D, N> {
    /// Create a pump
    ///
    /// Fails if the geometry does not describe an `N`-byte frame.
    pub fn new(
        exchange: &'a FrameExchange<'a, N>,
        display: D,
        geometry: FrameGeometry,
    ) -> Result<Self, ConfigError> {
        if !geometry.is_valid() {
            return Err(ConfigError::InvalidGeometry);
        }
        if geometry.frame_len() != N {
            return Err(ConfigError::FrameLenMismatch);
        }

        Ok(Self {
            exchange,
            display,
            geometry,
            stats: PumpStats::default(),
        })
    }

    /// Draw the published frame, if any
    ///
    /// Returns `Ok(true)` if a frame was drawn and `Ok(false)` if none
    /// was waiting. The buffer is released even when the draw fails.
    pub fn service(&mut self) -> Result<bool, DisplayError> {
        let Some(lease) = self.exchange.take_ready() else {
            return Ok(false);
        };

        let result = self
            .display
            .draw(&lease, 0, 0, self.geometry.width, self.geometry.height);
        self.exchange.release(lease);

        match result {
            Ok(()) => {
                self.stats.frames_drawn = self.stats.frames_drawn.wrapping_add(1);
                Ok(true)
            }
            Err(e) => {
                self.stats.draw_errors = self.stats.draw_errors.wrapping_add(1);
                Err(e)
            }
        }
    }

    /// Wait for a frame and draw it
    pub async fn next_frame(&mut self) -> Result<(), DisplayError> {
        loop {
            if self.service()? {
                return Ok(());
            }
            self.exchange.wait_ready().await;
        }
    }

    /// Draw frames forever, spinning while none is ready
    ///
    /// For targets without an async executor. Draw errors are counted and
    /// otherwise ignored.
    pub fn run_blocking(&mut self) -> ! {
        loop {
            if let Ok(false) = self.service() {
                core::hint::spin_loop();
            }
        }
    }

    /// Pump counters
    pub fn stats(&self) -> PumpStats {
        self.stats
    }

    /// Access the display
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameBuffer, FrameReceiver};
    use framelink_protocol::SENTINEL;

    #[derive(Default)]
    struct RecordingDisplay {
        frames: Vec<Vec<u8>>,
        windows: Vec<(u16, u16, u16, u16)>,
        fail: bool,
    }

    impl Display for RecordingDisplay {
        fn init(&mut self, _frequency_hz: u32) -> Result<(), DisplayError> {
            Ok(())
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn draw(
            &mut self,
            image: &[u8],
            x: u16,
            y: u16,
            width: u16,
            height: u16,
        ) -> Result<(), DisplayError> {
            if self.fail {
                return Err(DisplayError::Bus);
            }
            self.frames.push(image.to_vec());
            self.windows.push((x, y, width, height));
            Ok(())
        }
    }

    #[test]
    fn test_rejects_mismatched_geometry() {
        let exchange = FrameExchange::<8>::new();
        let result = DisplayPump::new(&exchange, RecordingDisplay::default(), FrameGeometry::new(4, 4, 4));
        assert!(result.is_ok());

        let result = DisplayPump::new(&exchange, RecordingDisplay::default(), FrameGeometry::new(4, 2, 4));
        assert_eq!(result.err(), Some(ConfigError::FrameLenMismatch));

        let result = DisplayPump::new(&exchange, RecordingDisplay::default(), FrameGeometry::new(3, 4, 4));
        assert_eq!(result.err(), Some(ConfigError::InvalidGeometry));
    }

    #[test]
    fn test_draws_full_panel_and_releases() {
        let mut a = FrameBuffer::<4>::new();
        let mut b = FrameBuffer::<4>::new();
        let exchange = FrameExchange::new();
        exchange.donate(&mut a).unwrap();
        exchange.donate(&mut b).unwrap();
        let mut rx = FrameReceiver::new(&exchange);
        let mut pump =
            DisplayPump::new(&exchange, RecordingDisplay::default(), FrameGeometry::new(4, 2, 4)).unwrap();

        assert_eq!(pump.service(), Ok(false));

        for byte in [SENTINEL, 0x12, 0x34, 0x56, 0x78] {
            rx.feed(byte);
        }
        assert_eq!(pump.service(), Ok(true));
        assert!(!exchange.is_ready());

        let display = pump.display_mut();
        assert_eq!(display.frames, vec![vec![0x12, 0x34, 0x56, 0x78]]);
        assert_eq!(display.windows, vec![(0, 0, 4, 2)]);
        assert_eq!(pump.stats().frames_drawn, 1);
        assert_eq!(exchange.stats().released, 1);
    }

    #[test]
    fn test_failed_draw_still_releases() {
        let mut only = FrameBuffer::<2>::new();
        let exchange = FrameExchange::new();
        exchange.donate(&mut only).unwrap();
        let mut rx = FrameReceiver::new(&exchange);
        let display = RecordingDisplay {
            fail: true,
            ..RecordingDisplay::default()
        };
        let mut pump = DisplayPump::new(&exchange, display, FrameGeometry::new(2, 2, 4)).unwrap();

        for byte in [SENTINEL, 1, 2] {
            rx.feed(byte);
        }
        assert_eq!(pump.service(), Err(DisplayError::Bus));
        assert_eq!(pump.stats().draw_errors, 1);

        // Single buffer is back in the pool, so the receiver can resync
        assert_eq!(rx.feed(SENTINEL), crate::frame::RxEvent::Resynced);
    }

    #[test]
    fn test_next_frame_drains_published_frame() {
        let mut a = FrameBuffer::<2>::new();
        let mut b = FrameBuffer::<2>::new();
        let exchange = FrameExchange::new();
        exchange.donate(&mut a).unwrap();
        exchange.donate(&mut b).unwrap();
        let mut rx = FrameReceiver::new(&exchange);
        let mut pump =
            DisplayPump::new(&exchange, RecordingDisplay::default(), FrameGeometry::new(2, 2, 4)).unwrap();

        for byte in [SENTINEL, 9, 8] {
            rx.feed(byte);
        }
        embassy_futures::block_on(pump.next_frame()).unwrap();

        assert_eq!(pump.display_mut().frames, vec![vec![9, 8]]);
    }

    #[test]
    fn test_latest_frame_wins_when_pump_is_slow() {
        let mut a = FrameBuffer::<2>::new();
        let mut b = FrameBuffer::<2>::new();
        let exchange = FrameExchange::new();
        exchange.donate(&mut a).unwrap();
        exchange.donate(&mut b).unwrap();
        let mut rx = FrameReceiver::new(&exchange);
        let mut pump =
            DisplayPump::new(&exchange, RecordingDisplay::default(), FrameGeometry::new(2, 2, 4)).unwrap();

        for byte in [SENTINEL, 1, 1, SENTINEL, 2, 2, SENTINEL, 3, 3] {
            rx.feed(byte);
        }
        assert_eq!(pump.service(), Ok(true));
        assert_eq!(pump.service(), Ok(false));

        assert_eq!(pump.display_mut().frames, vec![vec![3, 3]]);
        assert_eq!(exchange.stats().superseded, 2);
    }
}
