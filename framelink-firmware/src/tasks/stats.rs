//! Periodic pipeline statistics

use defmt::*;
use embassy_time::{Duration, Ticker};

use framelink_core::frame::ReceiverStats;
use framelink_core::pump::PumpStats;

use crate::channels::{FRAME_EXCHANGE, PUMP_STATS, RECEIVER_STATS, TRANSFER_GATE};

/// Statistics interval in seconds
pub const STATS_INTERVAL_S: u64 = 5;

/// Stats task - logs a summary of every pipeline stage
#[embassy_executor::task]
pub async fn stats_task() {
    info!("Stats task started");

    let mut ticker = Ticker::every(Duration::from_secs(STATS_INTERVAL_S));
    let mut receiver = ReceiverStats::default();
    let mut pump = PumpStats::default();

    loop {
        ticker.next().await;

        if let Some(latest) = RECEIVER_STATS.try_take() {
            receiver = latest;
        }
        if let Some(latest) = PUMP_STATS.try_take() {
            pump = latest;
        }
        let exchange = FRAME_EXCHANGE.stats();
        let gate = TRANSFER_GATE.stats();

        info!(
            "rx: {} bytes, {} frames, {} truncated, {} discarded, {} line errors | exchange: {} superseded | display: {} drawn, {} failed | bus: {}/{} transfers",
            receiver.bytes,
            receiver.frames,
            receiver.truncated,
            receiver.discarded,
            receiver.line_errors,
            exchange.superseded,
            pump.frames_drawn,
            pump.draw_errors,
            gate.completed,
            gate.submitted
        );
    }
}
