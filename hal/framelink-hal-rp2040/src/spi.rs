//! Display bus over the RP2040 SPI block
//!
//! The SPI runs in blocking, transmit-only mode. `blocking_write` returns
//! once the shift register has drained, so the bus is never busy between
//! calls and the transfer gate completes on its first status poll.

use embassy_rp::spi::{self, Blocking, Instance, Spi};
use framelink_hal::spi::{Phase, Polarity, Role};
use framelink_hal::{BusConfig, DisplayBus};

/// Display bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Word submitted while the bus is disabled
    Disabled,
    /// Only 8-bit words are supported
    UnsupportedWordWidth,
    /// Only master mode is supported
    UnsupportedRole,
    /// SPI driver reported a failure
    Transfer,
}

/// Build the embassy-rp SPI configuration for a bus configuration
pub fn spi_config(config: &BusConfig) -> spi::Config {
    let (polarity, phase): (Polarity, Phase) = config.mode.into();

    let mut out = spi::Config::default();
    out.frequency = config.bit_rate;
    out.polarity = match polarity {
        Polarity::IdleLow => spi::Polarity::IdleLow,
        Polarity::IdleHigh => spi::Polarity::IdleHigh,
    };
    out.phase = match phase {
        Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
        Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
    };
    out
}

/// Blocking SPI adapted to [`DisplayBus`]
pub struct Rp2040Bus<'d, T: Instance> {
    spi: Spi<'d, T, Blocking>,
    enabled: bool,
}

impl<'d, T: Instance> Rp2040Bus<'d, T> {
    /// Wrap a transmit-only SPI
    pub fn new(spi: Spi<'d, T, Blocking>) -> Self {
        Self {
            spi,
            enabled: false,
        }
    }
}

impl<T: Instance> DisplayBus for Rp2040Bus<'_, T> {
    type Error = BusError;

    fn configure(&mut self, config: &BusConfig) -> Result<(), BusError> {
        if config.role != Role::Master {
            return Err(BusError::UnsupportedRole);
        }
        if config.word_width != 8 {
            return Err(BusError::UnsupportedWordWidth);
        }

        self.spi.set_config(&spi_config(config));
        Ok(())
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn submit(&mut self, word: u16) -> Result<(), BusError> {
        if !self.enabled {
            return Err(BusError::Disabled);
        }
        self.spi
            .blocking_write(&[word as u8])
            .map_err(|_| BusError::Transfer)
    }

    fn is_busy(&self) -> bool {
        false
    }
}
