//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! `channels`.

pub mod display;
pub mod receiver;
pub mod stats;

pub use display::{display_task, Oled};
pub use receiver::receiver_task;
pub use stats::stats_task;
