//! Pipeline configuration
//!
//! The firmware generates a `PipelineConfig` constant from its device
//! file at build time; [`PipelineConfig::validate`] repeats the checks at
//! run time so host tools and tests get the same answer.

use framelink_hal::spi::{Mode, Role};
use framelink_hal::{BusConfig, UartConfig};
use framelink_protocol::{FrameGeometry, RIT128X96X4};

use crate::frame::MAX_FRAMES;

/// UART clock must run at least this many times the baud rate
pub const UART_OVERSAMPLING: u32 = 8;

/// Slowest master-mode SSI clock divider
pub const BUS_MASTER_DIVIDER: u32 = 2;

/// Slowest slave-mode SSI clock divider
pub const BUS_SLAVE_DIVIDER: u32 = 12;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Serial link baud rate is zero
    ZeroBaudRate,
    /// System clock cannot sample the requested baud rate
    LinkClockTooSlow,
    /// Display bus bit rate is zero
    ZeroBitRate,
    /// Display bus bit rate exceeds what the clock can generate
    BusRateTooHigh,
    /// Display bus word width outside 4-16 bits
    InvalidWordWidth,
    /// Geometry rows do not end on a byte boundary or depth unsupported
    InvalidGeometry,
    /// Frame count outside 1..=MAX_FRAMES
    InvalidFrameCount,
    /// Buffer size does not match the geometry
    FrameLenMismatch,
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    /// Clock feeding the UART and SSI peripherals, in Hz
    pub system_clock_hz: u32,
    /// Serial link parameters
    pub link: UartConfig,
    /// Display bus parameters
    pub bus: BusConfig,
    /// Panel geometry, which fixes the frame length
    pub geometry: FrameGeometry,
    /// Number of frame buffers (2 = double buffering)
    pub frame_count: usize,
}

impl PipelineConfig {
    /// 50 MHz clock, 1.5 Mbaud 8N1 link, 1 MHz mode 2 bus, RIT 128x96x4
    /// panel, double buffered
    pub const DEFAULT: Self = Self {
        system_clock_hz: 50_000_000,
        link: UartConfig::eight_n_one(1_500_000),
        bus: BusConfig {
            bit_rate: 1_000_000,
            mode: Mode::Mode2,
            role: Role::Master,
            word_width: 8,
        },
        geometry: RIT128X96X4,
        frame_count: 2,
    };

    /// Frame length in bytes
    pub const fn frame_len(&self) -> usize {
        self.geometry.frame_len()
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.link.baudrate == 0 {
            return Err(ConfigError::ZeroBaudRate);
        }
        if self.system_clock_hz / UART_OVERSAMPLING < self.link.baudrate {
            return Err(ConfigError::LinkClockTooSlow);
        }

        if self.bus.bit_rate == 0 {
            return Err(ConfigError::ZeroBitRate);
        }
        let divider = match self.bus.role {
            Role::Master => BUS_MASTER_DIVIDER,
            Role::Slave | Role::SlaveOutputDisabled => BUS_SLAVE_DIVIDER,
        };
        if self.bus.bit_rate > self.system_clock_hz / divider {
            return Err(ConfigError::BusRateTooHigh);
        }
        if !(4..=16).contains(&self.bus.word_width) {
            return Err(ConfigError::InvalidWordWidth);
        }

        if !self.geometry.is_valid() {
            return Err(ConfigError::InvalidGeometry);
        }
        if self.frame_count == 0 || self.frame_count > MAX_FRAMES {
            return Err(ConfigError::InvalidFrameCount);
        }

        Ok(())
    }

    /// Check that a buffer of `N` bytes holds exactly one frame
    pub fn check_frame_len<const N: usize>(&self) -> Result<(), ConfigError> {
        if self.frame_len() == N {
            Ok(())
        } else {
            Err(ConfigError::FrameLenMismatch)
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
