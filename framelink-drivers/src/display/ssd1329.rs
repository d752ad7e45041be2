//! SSD1329 OLED Display Driver
//!
//! Driver for 128x96, 4 bits/pixel SSD1329-based OLED panels (RIT P14201)
//! over a write-only synchronous serial bus plus a data/command line.
//!
//! Pixel data is packed two pixels per byte with the left pixel in the
//! high nibble, which is the controller's native RAM format, so frames go
//! to the panel without conversion.

use framelink_core::traits::{Display, DisplayError};
use framelink_core::{GatedBus, TransferGate};
use framelink_hal::spi::{Mode, Role};
use framelink_hal::{BusConfig, DisplayBus, OutputPin};

/// Display dimensions
pub const WIDTH: u16 = 128;
pub const HEIGHT: u16 = 96;

/// Bytes per full-width row
const ROW_BYTES: usize = WIDTH as usize / 2;

/// SSD1329 commands
#[allow(dead_code)]
mod cmd {
    pub const SET_COLUMN_ADDR: u8 = 0x15;
    pub const SET_ROW_ADDR: u8 = 0x75;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_PRECHARGE_CURRENT: u8 = 0x82;
    pub const SET_REMAP: u8 = 0xA0;
    pub const SET_START_LINE: u8 = 0xA1;
    pub const SET_DISPLAY_OFFSET: u8 = 0xA2;
    pub const SET_NORMAL: u8 = 0xA4;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_PHASE_LENGTH: u8 = 0xB1;
    pub const SET_FRAME_FREQUENCY: u8 = 0xB2;
    pub const SET_CLOCK_DIV: u8 = 0xB3;
    pub const DEFAULT_GRAY_TABLE: u8 = 0xB7;
    pub const SET_SECOND_PRECHARGE: u8 = 0xBB;
    pub const SET_PRECHARGE_VOLTAGE: u8 = 0xBC;
    pub const SET_COMMAND_LOCK: u8 = 0xFD;

    /// Column address increment, nibble remap, COM split
    pub const REMAP_HORIZONTAL: u8 = 0x52;
}

/// Controller bring-up, one command (with arguments) per entry
const INIT_SEQUENCE: &[&[u8]] = &[
    &[cmd::SET_COMMAND_LOCK, 0x12], // Unlock
    &[cmd::DISPLAY_OFF],
    &[cmd::SET_MUX_RATIO, 0x5F], // 96 lines
    &[cmd::SET_CONTRAST, 0xB7],
    &[cmd::SET_PRECHARGE_CURRENT, 0x3F],
    &[cmd::SET_REMAP, cmd::REMAP_HORIZONTAL],
    &[cmd::SET_START_LINE, 0x00],
    &[cmd::SET_DISPLAY_OFFSET, 0x4C],
    &[cmd::SET_PHASE_LENGTH, 0x11],
    &[cmd::SET_FRAME_FREQUENCY, 0x23],
    &[cmd::SET_CLOCK_DIV, 0xE2],
    &[cmd::DEFAULT_GRAY_TABLE],
    &[cmd::SET_SECOND_PRECHARGE, 0x01],
    &[cmd::SET_PRECHARGE_VOLTAGE, 0x3F],
    &[cmd::SET_NORMAL],
];

/// Line level on the data/command select pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Select {
    Command,
    Data,
}

/// SSD1329 OLED driver
pub struct Ssd1329<'g, B: DisplayBus, DC: OutputPin> {
    bus: GatedBus<'g, B>,
    dc: DC,
    initialized: bool,
}

impl<'g, B: DisplayBus, DC: OutputPin> Ssd1329<'g, B, DC> {
    /// Create a driver; the panel is untouched until [`Display::init`]
    pub fn new(bus: B, dc: DC, gate: &'g TransferGate) -> Self {
        Self {
            bus: GatedBus::new(bus, gate),
            dc,
            initialized: false,
        }
    }

    /// Check if `init` has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Turn the panel on
    pub fn display_on(&mut self) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        self.command(&[cmd::DISPLAY_ON])
    }

    /// Turn the panel off; RAM contents are kept
    pub fn display_off(&mut self) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        self.command(&[cmd::DISPLAY_OFF])
    }

    /// Release the bus and pin
    pub fn release(self) -> (B, DC) {
        (self.bus.into_inner(), self.dc)
    }

    fn ensure_initialized(&self) -> Result<(), DisplayError> {
        if self.initialized {
            Ok(())
        } else {
            Err(DisplayError::NotInitialized)
        }
    }

    /// Drive D/C, draining the bus first if the level changes
    fn select(&mut self, select: Select) {
        let want_data = select == Select::Data;
        if self.dc.is_set_high() != want_data {
            self.bus.wait_idle();
            self.dc.set_state(want_data);
        }
    }

    fn command(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.select(Select::Command);
        self.bus.transfer(bytes).map_err(|_| DisplayError::Bus)
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.select(Select::Data);
        self.bus.transfer(bytes).map_err(|_| DisplayError::Bus)
    }

    /// Set the RAM window for the following data
    fn window(&mut self, x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError> {
        // Callers validate the region, so every value fits in a byte
        let col_start = (x / 2) as u8;
        let col_end = ((x + width - 2) / 2) as u8;
        let row_start = y as u8;
        let row_end = (y + height - 1) as u8;

        self.command(&[
            cmd::SET_COLUMN_ADDR,
            col_start,
            col_end,
            cmd::SET_ROW_ADDR,
            row_start,
            row_end,
            cmd::SET_REMAP,
            cmd::REMAP_HORIZONTAL,
        ])
    }

    fn check_region(image: &[u8], x: u16, y: u16, width: u16, height: u16) -> Result<usize, DisplayError> {
        let aligned = x % 2 == 0 && width % 2 == 0;
        let non_empty = width > 0 && height > 0;
        let on_panel = u32::from(x) + u32::from(width) <= u32::from(WIDTH)
            && u32::from(y) + u32::from(height) <= u32::from(HEIGHT);

        if !(aligned && non_empty && on_panel) {
            return Err(DisplayError::InvalidRegion);
        }

        let row_bytes = usize::from(width / 2);
        if image.len() < row_bytes * usize::from(height) {
            return Err(DisplayError::InvalidRegion);
        }

        Ok(row_bytes)
    }
}

impl<B: DisplayBus, DC: OutputPin> Display for Ssd1329<'_, B, DC> {
    fn init(&mut self, frequency_hz: u32) -> Result<(), DisplayError> {
        let config = BusConfig {
            bit_rate: frequency_hz,
            mode: Mode::Mode2,
            role: Role::Master,
            word_width: 8,
        };
        self.bus.configure(&config).map_err(|_| DisplayError::Bus)?;

        for command in INIT_SEQUENCE {
            self.command(command)?;
        }
        self.initialized = true;

        self.clear()?;
        self.command(&[cmd::DISPLAY_ON])
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ensure_initialized()?;

        const BLANK_ROW: [u8; ROW_BYTES] = [0; ROW_BYTES];

        self.window(0, 0, WIDTH, HEIGHT)?;
        for _ in 0..HEIGHT {
            self.data(&BLANK_ROW)?;
        }
        Ok(())
    }

    fn draw(&mut self, image: &[u8], x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError> {
        self.ensure_initialized()?;
        let row_bytes = Self::check_region(image, x, y, width, height)?;

        self.window(x, y, width, height)?;
        for row in image.chunks_exact(row_bytes).take(usize::from(height)) {
            self.data(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Bytes seen on the wire, tagged with the D/C level
    type Wire = Rc<RefCell<Vec<(bool, u8)>>>;

    struct MockPin {
        level: Rc<Cell<bool>>,
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) {
            self.level.set(true);
        }

        fn set_low(&mut self) {
            self.level.set(false);
        }

        fn is_set_high(&self) -> bool {
            self.level.get()
        }
    }

    struct MockBus {
        level: Rc<Cell<bool>>,
        wire: Wire,
        config: Option<BusConfig>,
        enabled: bool,
        shifting: Cell<bool>,
    }

    impl DisplayBus for MockBus {
        type Error = ();

        fn configure(&mut self, config: &BusConfig) -> Result<(), ()> {
            self.config = Some(*config);
            Ok(())
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn submit(&mut self, word: u16) -> Result<(), ()> {
            if !self.enabled {
                return Err(());
            }
            self.wire.borrow_mut().push((self.level.get(), word as u8));
            self.shifting.set(true);
            Ok(())
        }

        fn is_busy(&self) -> bool {
            // Busy for one status read after each word
            self.shifting.replace(false)
        }
    }

    fn driver(gate: &TransferGate) -> (Ssd1329<'_, MockBus, MockPin>, Wire) {
        let level = Rc::new(Cell::new(false));
        let wire: Wire = Rc::default();
        let bus = MockBus {
            level: level.clone(),
            wire: wire.clone(),
            config: None,
            enabled: false,
            shifting: Cell::new(false),
        };
        (Ssd1329::new(bus, MockPin { level }, gate), wire)
    }

    fn commands(wire: &Wire) -> Vec<u8> {
        wire.borrow().iter().filter(|(dc, _)| !dc).map(|&(_, b)| b).collect()
    }

    fn data(wire: &Wire) -> Vec<u8> {
        wire.borrow().iter().filter(|(dc, _)| *dc).map(|&(_, b)| b).collect()
    }

    #[test]
    fn test_draw_before_init_fails() {
        let gate = TransferGate::new();
        let (mut oled, wire) = driver(&gate);

        assert_eq!(oled.draw(&[0; 4], 0, 0, 4, 2), Err(DisplayError::NotInitialized));
        assert_eq!(oled.clear(), Err(DisplayError::NotInitialized));
        assert!(wire.borrow().is_empty());
    }

    #[test]
    fn test_init_sequence() {
        let gate = TransferGate::new();
        let (mut oled, wire) = driver(&gate);

        oled.init(1_000_000).unwrap();
        assert!(oled.is_initialized());

        let cmds = commands(&wire);
        assert_eq!(&cmds[..3], &[0xFD, 0x12, 0xAE]);
        assert_eq!(cmds.last(), Some(&0xAF));
        assert_eq!(data(&wire).len(), 6144);
        assert!(data(&wire).iter().all(|&b| b == 0));

        let (bus, _) = oled.release();
        let config = bus.config.unwrap();
        assert_eq!(config.bit_rate, 1_000_000);
        assert_eq!(config.mode, Mode::Mode2);
        assert_eq!(config.word_width, 8);
        assert!(bus.enabled);
    }

    #[test]
    fn test_draw_window_and_data() {
        let gate = TransferGate::new();
        let (mut oled, wire) = driver(&gate);
        oled.init(1_000_000).unwrap();
        wire.borrow_mut().clear();

        let image = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC];
        oled.draw(&image, 4, 10, 4, 3).unwrap();

        assert_eq!(
            commands(&wire),
            vec![0x15, 2, 3, 0x75, 10, 12, 0xA0, 0x52]
        );
        assert_eq!(data(&wire), image.to_vec());
    }

    #[test]
    fn test_full_frame_draw() {
        let gate = TransferGate::new();
        let (mut oled, wire) = driver(&gate);
        oled.init(1_000_000).unwrap();
        wire.borrow_mut().clear();

        let frame: Vec<u8> = (0..6144).map(|i| (i % 251) as u8).collect();
        oled.draw(&frame, 0, 0, WIDTH, HEIGHT).unwrap();

        assert_eq!(&commands(&wire)[..6], &[0x15, 0, 63, 0x75, 0, 95]);
        assert_eq!(data(&wire), frame);
    }

    #[test]
    fn test_invalid_regions_rejected() {
        let gate = TransferGate::new();
        let (mut oled, _wire) = driver(&gate);
        oled.init(1_000_000).unwrap();

        let image = [0u8; 6144];
        assert_eq!(oled.draw(&image, 1, 0, 4, 2), Err(DisplayError::InvalidRegion));
        assert_eq!(oled.draw(&image, 0, 0, 3, 2), Err(DisplayError::InvalidRegion));
        assert_eq!(oled.draw(&image, 126, 0, 4, 2), Err(DisplayError::InvalidRegion));
        assert_eq!(oled.draw(&image, 0, 95, 2, 2), Err(DisplayError::InvalidRegion));
        assert_eq!(oled.draw(&image, 0, 0, 0, 2), Err(DisplayError::InvalidRegion));
        assert_eq!(oled.draw(&image[..3], 0, 0, 4, 2), Err(DisplayError::InvalidRegion));
    }

    #[test]
    fn test_dc_changes_only_when_bus_is_idle() {
        let gate = TransferGate::new();
        let (mut oled, _wire) = driver(&gate);
        oled.init(1_000_000).unwrap();

        oled.draw(&[0xFF; 2], 0, 0, 2, 2).unwrap();
        // Last transfer is data; switching to a command drains it first
        oled.display_off().unwrap();
        assert_eq!(gate.stats().submitted, gate.stats().completed + 1);
    }
}
