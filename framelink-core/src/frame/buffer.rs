//! Fixed-capacity frame storage.

/// Outcome of storing one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Push {
    /// Byte stored, frame still incomplete
    Stored,
    /// Byte stored and the frame is now complete
    Completed,
}

/// The buffer already holds a complete frame; nothing was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferFull;

/// Storage for one frame plus its write cursor and readiness flag
///
/// Invariant: `ready` implies `cursor == N`, and no byte is written while
/// `ready` is set.
#[derive(Debug, Clone)]
pub struct FrameBuffer<const N: usize> {
    storage: [u8; N],
    cursor: usize,
    ready: bool,
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "frame capacity must be positive");

    /// Create an empty buffer
    pub const fn new() -> Self {
        let () = Self::NON_EMPTY;
        Self {
            storage: [0; N],
            cursor: 0,
            ready: false,
        }
    }

    /// Frame length in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Next write offset
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Check if a complete frame is held
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Append one byte at the cursor
    pub fn push(&mut self, byte: u8) -> Result<Push, BufferFull> {
        if self.ready {
            return Err(BufferFull);
        }

        let slot = self.storage.get_mut(self.cursor).ok_or(BufferFull)?;
        *slot = byte;
        self.cursor += 1;

        if self.cursor == N {
            self.ready = true;
            Ok(Push::Completed)
        } else {
            Ok(Push::Stored)
        }
    }

    /// Discard the contents and start again at offset 0
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.ready = false;
    }

    /// The complete frame, if one is held
    pub fn frame(&self) -> Option<&[u8; N]> {
        if self.ready {
            Some(&self.storage)
        } else {
            None
        }
    }

    /// Bytes written so far
    pub fn filled(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = FrameBuffer::<4>::new();
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.cursor(), 0);
        assert!(!buffer.is_ready());
        assert!(buffer.frame().is_none());
        assert!(buffer.filled().is_empty());
    }

    #[test]
    fn test_fill_to_capacity() {
        let mut buffer = FrameBuffer::<3>::new();

        assert_eq!(buffer.push(1), Ok(Push::Stored));
        assert_eq!(buffer.push(2), Ok(Push::Stored));
        assert_eq!(buffer.filled(), &[1, 2]);
        assert_eq!(buffer.push(3), Ok(Push::Completed));

        assert!(buffer.is_ready());
        assert_eq!(buffer.cursor(), 3);
        assert_eq!(buffer.frame(), Some(&[1, 2, 3]));
    }

    #[test]
    fn test_full_buffer_rejects_bytes() {
        let mut buffer = FrameBuffer::<2>::new();
        buffer.push(7).unwrap();
        buffer.push(8).unwrap();

        assert_eq!(buffer.push(9), Err(BufferFull));
        assert_eq!(buffer.cursor(), 2);
        assert_eq!(buffer.frame(), Some(&[7, 8]));
    }

    #[test]
    fn test_restart() {
        let mut buffer = FrameBuffer::<2>::new();
        buffer.push(1).unwrap();
        buffer.push(2).unwrap();

        buffer.restart();

        assert_eq!(buffer.cursor(), 0);
        assert!(!buffer.is_ready());
        assert_eq!(buffer.push(5), Ok(Push::Stored));
        assert_eq!(buffer.filled(), &[5]);
    }
}
