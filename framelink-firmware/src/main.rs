//! Framelink - UART frame streaming firmware
//!
//! Receives packed 4-bit grayscale frames on UART0 at 1.5 Mbaud and
//! draws them on a 128x96 SSD1329 OLED over SPI0.
//!
//! # Pins
//!
//! - GPIO1: UART0 RX (frame stream in)
//! - GPIO17: panel chip select, held low
//! - GPIO18/19: SPI0 SCK/MOSI
//! - GPIO20: panel data/command select
//! - GPIO21: panel reset (active low)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::Spi;
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUartRx};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use framelink_drivers::display::Ssd1329;
use framelink_hal_rp2040::{embassy_config, spi_config, Rp2040Bus, Rp2040Link, Rp2040Pin};

use crate::channels::{FRAMES, FRAME_EXCHANGE, TRANSFER_GATE};
use crate::device::{DEVICE, FRAME_LEN};

mod channels;
mod device;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// UART ring buffer size; holds about 7 ms of data at 1.5 Mbaud
const RX_BUF_SIZE: usize = 1024;

// Static cell for the UART ring buffer (must live forever)
static RX_BUF: StaticCell<[u8; RX_BUF_SIZE]> = StaticCell::new();

/// High-priority executor for the receive task
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Framelink firmware starting...");

    unwrap!(DEVICE.validate());
    unwrap!(DEVICE.check_frame_len::<FRAME_LEN>());

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Hand the frame buffers to the exchange before the receiver starts
    for frame in FRAMES.take().iter_mut() {
        if FRAME_EXCHANGE.donate(frame).is_err() {
            warn!("Frame pool full, buffer unused");
        }
    }
    info!(
        "{} frame buffer(s) of {} bytes",
        FRAME_EXCHANGE.pool_size(),
        FRAME_LEN
    );

    // Setup UART0 for the frame stream
    let rx_buf = RX_BUF.init([0u8; RX_BUF_SIZE]);
    let rx = BufferedUartRx::new(p.UART0, Irqs, p.PIN_1, rx_buf, embassy_config(&DEVICE.link));
    let link = Rp2040Link::new(rx, DEVICE.link);
    info!("UART initialized at {} baud", DEVICE.link.baudrate);

    // Setup SPI0 and control lines for the panel
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config(&DEVICE.bus));
    let dc = Rp2040Pin::new(p.PIN_20, Level::Low);
    let reset = Output::new(p.PIN_21, Level::Low);
    let cs = Output::new(p.PIN_17, Level::Low);
    let oled = Ssd1329::new(Rp2040Bus::new(spi), dc, &TRANSFER_GATE);
    info!("SPI initialized for display");

    // Receive path preempts the display pump
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(tasks::receiver_task(link)).unwrap();

    spawner.spawn(tasks::display_task(oled, reset, cs)).unwrap();
    spawner.spawn(tasks::stats_task()).unwrap();

    info!("All tasks spawned, firmware running");
}
