//! Display controller drivers

pub mod ssd1329;

pub use ssd1329::Ssd1329;
