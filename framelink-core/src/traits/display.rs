//! Display driver trait for packed grayscale panels

/// Errors that can occur while driving the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Display bus rejected a transfer or configuration
    Bus,
    /// Region is misaligned, off-panel, or larger than the image
    InvalidRegion,
    /// `draw` or `clear` called before `init`
    NotInitialized,
}

/// Trait for a frame-addressable display
///
/// Images are packed the way they arrive on the wire: two 4-bit pixels
/// per byte, left pixel in the high nibble, rows top to bottom. Format
/// conversion, if any, is the driver's business.
pub trait Display {
    /// Bring up the bus at `frequency_hz` and initialize the controller
    fn init(&mut self, frequency_hz: u32) -> Result<(), DisplayError>;

    /// Blank the whole panel
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Draw a packed image into a window
    ///
    /// - `image`: packed pixels, at least `width * height / 2` bytes
    /// - `x`, `y`: top-left corner in pixels
    /// - `width`, `height`: window size in pixels
    ///
    /// Blocks until every byte has been handed to the bus.
    fn draw(&mut self, image: &[u8], x: u16, y: u16, width: u16, height: u16) -> Result<(), DisplayError>;
}
