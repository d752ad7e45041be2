//! Display bus abstractions
//!
//! A synchronous serial bus that shifts words out to the display
//! controller. Completion tracking lives in `framelink-core`'s
//! `TransferGate`; the bus itself only reports its shift-register state.

/// Synchronous display bus
pub trait DisplayBus {
    /// Error type for bus operations
    type Error;

    /// Apply clock rate, frame format, role and word width
    ///
    /// Only called while the bus is disabled.
    fn configure(&mut self, config: &BusConfig) -> Result<(), Self::Error>;

    /// Enable the bus
    fn enable(&mut self);

    /// Disable the bus
    fn disable(&mut self);

    /// Queue one word for transmission
    ///
    /// Blocks until the transmit FIFO has space. Only the low
    /// `word_width` bits are sent.
    fn submit(&mut self, word: u16) -> Result<(), Self::Error>;

    /// Check if the transmitter is still shifting data out
    ///
    /// Pure status read; no interrupt is armed as a side effect.
    fn is_busy(&self) -> bool;
}

/// Display bus configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Bit rate in Hz
    pub bit_rate: u32,
    /// Clock polarity and phase
    pub mode: Mode,
    /// Master or slave operation
    pub role: Role,
    /// Bits per transferred word (4-16)
    pub word_width: u8,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bit_rate: 1_000_000, // 1 MHz
            mode: Mode::Mode2,
            role: Role::Master,
            word_width: 8,
        }
    }
}

/// Bus role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Drives the clock
    Master,
    /// Follows an external clock
    Slave,
    /// Slave with its data output disabled
    SlaveOutputDisabled,
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    /// Mode from its conventional number (0-3)
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(Mode::Mode0),
            1 => Some(Mode::Mode1),
            2 => Some(Mode::Mode2),
            3 => Some(Mode::Mode3),
            _ => None,
        }
    }
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_number() {
        assert_eq!(Mode::from_number(2), Some(Mode::Mode2));
        assert_eq!(Mode::from_number(4), None);
    }

    #[test]
    fn test_mode2_idles_high() {
        let (polarity, phase): (Polarity, Phase) = Mode::Mode2.into();
        assert_eq!(polarity, Polarity::IdleHigh);
        assert_eq!(phase, Phase::CaptureOnFirstTransition);
    }
}
