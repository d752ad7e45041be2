//! Serial link over the RP2040 buffered UART
//!
//! The UART interrupt fills embassy-rp's ring buffer; the receive task
//! awaits data with [`Rp2040Link::wait_readable`] and then drains it byte
//! by byte through [`SerialLink::try_read_byte`].

use embassy_rp::uart::{self, BufferedUartRx};
use embedded_io_async::Read;
use framelink_hal::uart::{DataBits, Parity, StopBits};
use framelink_hal::{LineStatus, SerialLink, UartConfig};

/// Bytes moved out of the ring buffer per wake-up
const CHUNK_SIZE: usize = 64;

/// Serial link configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Requested format differs from the one the UART was built with
    ConfigMismatch,
}

/// Build the embassy-rp UART configuration for a link configuration
pub fn embassy_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Five => uart::DataBits::DataBits5,
        DataBits::Six => uart::DataBits::DataBits6,
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}

fn line_status(error: uart::Error) -> LineStatus {
    match error {
        uart::Error::Overrun => LineStatus::Overrun,
        uart::Error::Break => LineStatus::Break,
        uart::Error::Parity => LineStatus::Parity,
        _ => LineStatus::Framing,
    }
}

/// Buffered UART receiver adapted to [`SerialLink`]
pub struct Rp2040Link {
    rx: BufferedUartRx,
    config: UartConfig,
    chunk: [u8; CHUNK_SIZE],
    head: usize,
    len: usize,
    pending: Option<LineStatus>,
    enabled: bool,
}

impl Rp2040Link {
    /// Wrap a receiver built with `embassy_config(&config)`
    pub fn new(rx: BufferedUartRx, config: UartConfig) -> Self {
        Self {
            rx,
            config,
            chunk: [0; CHUNK_SIZE],
            head: 0,
            len: 0,
            pending: None,
            enabled: false,
        }
    }

    /// Wait until `try_read_byte` has something to report
    pub async fn wait_readable(&mut self) {
        if self.head < self.len || self.pending.is_some() {
            return;
        }

        match self.rx.read(&mut self.chunk).await {
            Ok(n) => {
                self.head = 0;
                self.len = n;
            }
            Err(e) => self.pending = Some(line_status(e)),
        }
    }
}

impl SerialLink for Rp2040Link {
    type Error = LinkError;

    fn configure(&mut self, _clock_hz: u32, config: &UartConfig) -> Result<(), LinkError> {
        // Baud divisors are set by embassy-rp when the UART is created
        if *config == self.config {
            Ok(())
        } else {
            Err(LinkError::ConfigMismatch)
        }
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
        self.head = 0;
        self.len = 0;
        self.pending = None;
    }

    fn try_read_byte(&mut self) -> Result<Option<u8>, LineStatus> {
        if !self.enabled {
            return Ok(None);
        }
        if let Some(status) = self.pending.take() {
            return Err(status);
        }

        match self.chunk[..self.len].get(self.head) {
            Some(&byte) => {
                self.head += 1;
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }
}
