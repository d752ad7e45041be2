//! Producer/consumer frame exchange.
//!
//! The receiver publishes complete frames into a single ready slot and
//! takes spare buffers to write the next frame into. The pump leases the
//! ready frame, draws it, and returns the buffer as a spare. Every slot
//! access happens inside a critical section and only moves references, so
//! the receive interrupt is never held off for longer than a few
//! instructions.
//!
//! With two buffers the receiver always writes into the buffer the pump is
//! not reading. With one buffer the receiver starves while the pump draws
//! and drops the frames it cannot store.

use core::cell::RefCell;
use core::ops::Deref;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use super::buffer::FrameBuffer;

/// Maximum number of buffers an exchange can circulate
pub const MAX_FRAMES: usize = 3;

/// Hand-off counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExchangeStats {
    /// Frames published by the receiver
    pub published: u32,
    /// Published frames replaced by a newer one before the pump took them
    pub superseded: u32,
    /// Frames returned by the pump
    pub released: u32,
}

struct Slots<'a, const N: usize> {
    ready: Option<&'a mut FrameBuffer<N>>,
    spare: [Option<&'a mut FrameBuffer<N>>; MAX_FRAMES],
    pool: usize,
    stats: ExchangeStats,
}

impl<'a, const N: usize> Slots<'a, N> {
    const EMPTY: Option<&'a mut FrameBuffer<N>> = None;

    const fn new() -> Self {
        Self {
            ready: None,
            spare: [Self::EMPTY; MAX_FRAMES],
            pool: 0,
            stats: ExchangeStats {
                published: 0,
                superseded: 0,
                released: 0,
            },
        }
    }

    fn put_spare(&mut self, frame: &'a mut FrameBuffer<N>) -> Result<(), &'a mut FrameBuffer<N>> {
        match self.spare.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(frame);
                Ok(())
            }
            None => Err(frame),
        }
    }

    fn take_spare(&mut self) -> Option<&'a mut FrameBuffer<N>> {
        self.spare.iter_mut().find_map(Option::take)
    }
}

/// Exclusive read access to a published frame
///
/// Only [`FrameExchange::take_ready`] creates a lease, and only
/// [`FrameExchange::release`] hands the buffer back, so the receiver can
/// never write into a frame while the pump holds it.
#[must_use = "a lease must be returned with FrameExchange::release"]
pub struct FrameLease<'a, const N: usize> {
    frame: &'a mut FrameBuffer<N>,
}

impl<const N: usize> FrameLease<'_, N> {
    /// The leased frame
    pub fn bytes(&self) -> &[u8] {
        self.frame.filled()
    }
}

impl<const N: usize> Deref for FrameLease<'_, N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes()
    }
}

/// Shared hand-off point between receiver and pump
pub struct FrameExchange<'a, const N: usize> {
    slots: Mutex<CriticalSectionRawMutex, RefCell<Slots<'a, N>>>,
    published: Signal<CriticalSectionRawMutex, ()>,
}

impl<const N: usize> Default for FrameExchange<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> FrameExchange<'a, N> {
    /// Create an exchange with no buffers
    ///
    /// Buffers are added with [`donate`](Self::donate) before the receiver
    /// is created.
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots::new())),
            published: Signal::new(),
        }
    }

    /// Add a buffer to the pool
    ///
    /// Returns the buffer if the pool already holds [`MAX_FRAMES`].
    pub fn donate(&self, frame: &'a mut FrameBuffer<N>) -> Result<(), &'a mut FrameBuffer<N>> {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            if slots.pool >= MAX_FRAMES {
                return Err(frame);
            }
            frame.restart();
            slots.put_spare(frame)?;
            slots.pool += 1;
            Ok(())
        })
    }

    /// Number of buffers circulating through this exchange
    pub fn pool_size(&self) -> usize {
        self.slots.lock(|cell| cell.borrow().pool)
    }

    /// Check if a published frame is waiting for the pump
    pub fn is_ready(&self) -> bool {
        self.slots.lock(|cell| cell.borrow().ready.is_some())
    }

    /// Snapshot of the hand-off counters
    pub fn stats(&self) -> ExchangeStats {
        self.slots.lock(|cell| cell.borrow().stats)
    }

    /// Take a spare buffer for writing (receiver side)
    pub fn reclaim(&self) -> Option<&'a mut FrameBuffer<N>> {
        self.slots.lock(|cell| cell.borrow_mut().take_spare())
    }

    /// Publish a complete frame (receiver side)
    ///
    /// Returns the buffer the receiver should write next: a spare if one
    /// is available, or the previously published frame if the pump never
    /// took it. `None` means the receiver has nothing to write into until
    /// the pump releases a buffer.
    pub fn publish(&self, frame: &'a mut FrameBuffer<N>) -> Option<&'a mut FrameBuffer<N>> {
        debug_assert!(frame.is_ready());

        let next = self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            slots.stats.published = slots.stats.published.wrapping_add(1);

            match slots.ready.replace(frame) {
                Some(stale) => {
                    stale.restart();
                    slots.stats.superseded = slots.stats.superseded.wrapping_add(1);
                    Some(stale)
                }
                None => slots.take_spare(),
            }
        });

        self.published.signal(());
        next
    }

    /// Lease the published frame (pump side)
    pub fn take_ready(&self) -> Option<FrameLease<'a, N>> {
        self.slots
            .lock(|cell| cell.borrow_mut().ready.take())
            .map(|frame| FrameLease { frame })
    }

    /// Return a leased frame to the pool (pump side)
    pub fn release(&self, lease: FrameLease<'a, N>) {
        let frame = lease.frame;
        frame.restart();

        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            // Spare slots cover the whole pool, so a leased buffer always fits
            let _ = slots.put_spare(frame);
            slots.stats.released = slots.stats.released.wrapping_add(1);
        });
    }

    /// Wait until a frame has been published
    ///
    /// May return spuriously; callers re-check with
    /// [`take_ready`](Self::take_ready).
    pub async fn wait_ready(&self) {
        if self.is_ready() {
            return;
        }
        self.published.wait().await;
    }
}
