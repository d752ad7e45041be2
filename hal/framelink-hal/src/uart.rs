//! Serial link abstractions
//!
//! The frame receiver pulls bytes out of the link one at a time from its
//! interrupt context. Line conditions reported by the peripheral are
//! surfaced alongside the data so the receiver can resynchronize.

/// Line status conditions reported by a UART receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineStatus {
    /// Receive FIFO overflowed and data was lost
    Overrun,
    /// Stop bit not detected
    Framing,
    /// Parity mismatch
    Parity,
    /// Line held low for longer than a character time
    Break,
}

/// Serial receiver feeding the frame pipeline
///
/// `configure` is called once at bring-up; `try_read_byte` is called from
/// the receive context until it reports that no data is pending.
pub trait SerialLink {
    /// Error type for configuration
    type Error;

    /// Apply baud rate and character format
    ///
    /// `clock_hz` is the frequency of the clock feeding the peripheral.
    fn configure(&mut self, clock_hz: u32, config: &UartConfig) -> Result<(), Self::Error>;

    /// Start accepting bytes
    fn enable(&mut self);

    /// Stop accepting bytes
    fn disable(&mut self);

    /// Take the next received byte without blocking
    ///
    /// Returns `Ok(None)` when nothing is pending and `Err` when the
    /// peripheral flagged a line condition for the pending character.
    fn try_read_byte(&mut self) -> Result<Option<u8>, LineStatus>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// 8 data bits, no parity, one stop bit at the given rate
    pub const fn eight_n_one(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::eight_n_one(1_500_000)
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
