//! Push-pull outputs

use embassy_rp::gpio::{Level, Output, Pin};
use embassy_rp::Peri;
use framelink_hal::OutputPin;

/// GPIO output driving a display control line
pub struct Rp2040Pin<'d> {
    pin: Output<'d>,
}

impl<'d> Rp2040Pin<'d> {
    /// Configure `pin` as an output at `initial` level
    pub fn new(pin: Peri<'d, impl Pin>, initial: Level) -> Self {
        Self {
            pin: Output::new(pin, initial),
        }
    }
}

impl OutputPin for Rp2040Pin<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}
