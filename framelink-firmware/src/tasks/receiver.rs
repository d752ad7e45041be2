//! Frame receive task
//!
//! Runs on the high-priority interrupt executor so frame assembly
//! preempts the display pump. Drains the UART ring buffer through the
//! sentinel state machine and publishes completed frames.

use defmt::*;

use framelink_core::FrameReceiver;
use framelink_hal::SerialLink;
use framelink_hal_rp2040::Rp2040Link;

use crate::channels::{FRAME_EXCHANGE, RECEIVER_STATS};
use crate::device::DEVICE;

/// Frame receive task - reassembles frames from the serial link
#[embassy_executor::task]
pub async fn receiver_task(mut link: Rp2040Link) {
    info!("Frame receiver task started");

    unwrap!(link.configure(DEVICE.system_clock_hz, &DEVICE.link));
    link.enable();

    let mut receiver = FrameReceiver::new(&FRAME_EXCHANGE);
    let mut last = receiver.stats();

    loop {
        link.wait_readable().await;

        let published = receiver.service(&mut link);
        if published > 0 {
            trace!("RX: {} frame(s) published", published);
        }

        let stats = receiver.stats();
        if stats.line_errors != last.line_errors {
            warn!("UART line error, frame dropped ({} total)", stats.line_errors);
        }
        if stats.truncated != last.truncated {
            debug!("Partial frame dropped at resync");
        }
        if stats.starved != last.starved {
            debug!("No free frame buffer, waiting for display");
        }

        RECEIVER_STATS.signal(stats);
        last = stats;
    }
}
