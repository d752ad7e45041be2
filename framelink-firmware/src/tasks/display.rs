//! Display pump task
//!
//! Resets and initializes the panel, then draws every frame the receiver
//! publishes. Runs on the thread executor; drawing blocks this task for
//! the whole SPI transfer.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_time::{Duration, Timer};

use framelink_core::{Display, DisplayPump};
use framelink_drivers::display::Ssd1329;
use framelink_hal_rp2040::{Rp2040Bus, Rp2040Pin};

use crate::channels::{FRAME_EXCHANGE, PUMP_STATS};
use crate::device::DEVICE;

/// Panel reset pulse width and settle time
const RESET_PULSE: Duration = Duration::from_millis(1);

/// The panel driver as wired on this board
pub type Oled = Ssd1329<'static, Rp2040Bus<'static, SPI0>, Rp2040Pin<'static>>;

/// Display task - pushes completed frames to the OLED
#[embassy_executor::task]
pub async fn display_task(mut oled: Oled, mut reset: Output<'static>, _cs: Output<'static>) {
    info!("Display task started");

    reset.set_low();
    Timer::after(RESET_PULSE).await;
    reset.set_high();
    Timer::after(RESET_PULSE).await;

    if let Err(e) = oled.init(DEVICE.bus.bit_rate) {
        error!("Display init failed: {:?}", e);
        return;
    }
    info!(
        "Display initialized: {}x{} @ {} Hz",
        DEVICE.geometry.width, DEVICE.geometry.height, DEVICE.bus.bit_rate
    );

    let mut pump = unwrap!(DisplayPump::new(&FRAME_EXCHANGE, oled, DEVICE.geometry));

    loop {
        match pump.next_frame().await {
            Ok(()) => trace!("Frame drawn"),
            Err(e) => warn!("Frame draw failed: {:?}", e),
        }
        PUMP_STATS.signal(pump.stats());
    }
}
