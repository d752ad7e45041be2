//! Hardware abstraction traits
//!
//! These traits define the interface between the frame pipeline and the
//! display driver that turns a packed frame into controller traffic.

pub mod display;

pub use display::{Display, DisplayError};
