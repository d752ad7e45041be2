//! Display bus transfer gate.
//!
//! One transfer may be outstanding on the display bus at a time. The gate
//! is an explicit two-state machine:
//!
//! ```text
//!         begin (Acquire)
//!   Idle ─────────────────► Busy
//!    ▲                        │
//!    └────────────────────────┘
//!         complete (Release)
//! ```
//!
//! Submitting while Busy waits for completion; a transfer is never
//! dropped. Completion is an explicit call made by whatever observes the
//! end of the transfer: a bus interrupt, or [`GatedBus`] polling the bus
//! status when the peripheral has no completion interrupt.
//!
//! There is no timeout. A bus that never completes blocks the submitter
//! forever.

use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::waitqueue::AtomicWaker;
use framelink_hal::{BusConfig, DisplayBus};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateState {
    /// No transfer outstanding
    Idle,
    /// A transfer has been submitted and not yet completed
    Busy,
}

/// A transfer is already outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GateBusy;

/// Transfer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GateStats {
    /// Transfers started
    pub submitted: u32,
    /// Transfers completed
    pub completed: u32,
}

/// Busy/idle tracking for the display bus
///
/// Safe to share between the main context and an interrupt: the state is
/// a single atomic flag and the waiting task is woken through an
/// [`AtomicWaker`].
pub struct TransferGate {
    busy: AtomicBool,
    waker: AtomicWaker,
    submitted: AtomicU32,
    completed: AtomicU32,
}

impl Default for TransferGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferGate {
    /// Create an idle gate
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            waker: AtomicWaker::new(),
            submitted: AtomicU32::new(0),
            completed: AtomicU32::new(0),
        }
    }

    /// Current state
    pub fn state(&self) -> GateState {
        if self.is_busy() {
            GateState::Busy
        } else {
            GateState::Idle
        }
    }

    /// Check if a transfer is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start a transfer if the gate is idle
    pub fn try_begin(&self) -> Result<(), GateBusy> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| GateBusy)?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Start a transfer, spinning until the gate is idle
    pub fn begin_blocking(&self) {
        self.begin_blocking_with(core::hint::spin_loop);
    }

    /// Start a transfer, calling `poll` between attempts
    ///
    /// `poll` is where a caller without a completion interrupt checks the
    /// peripheral and calls [`complete`](Self::complete).
    pub fn begin_blocking_with(&self, mut poll: impl FnMut()) {
        while self.try_begin().is_err() {
            poll();
        }
    }

    /// Start a transfer, waiting asynchronously for the gate to go idle
    pub async fn begin(&self) {
        poll_fn(|cx| {
            if self.try_begin().is_ok() {
                return Poll::Ready(());
            }
            self.waker.register(cx.waker());
            // Completion may have landed between the attempt and registration
            if self.try_begin().is_ok() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Mark the outstanding transfer as complete
    ///
    /// Callable from interrupt context. Completing an idle gate has no
    /// effect beyond waking a waiter.
    pub fn complete(&self) {
        if self.busy.swap(false, Ordering::Release) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
        self.waker.wake();
    }

    /// Snapshot of the transfer counters
    pub fn stats(&self) -> GateStats {
        GateStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
        }
    }
}

/// A [`DisplayBus`] whose transfers go through a [`TransferGate`]
///
/// Each [`transfer`](Self::transfer) takes the gate and leaves it Busy.
/// The gate is released either by an external completion source calling
/// [`TransferGate::complete`] or by this wrapper observing that the bus
/// has stopped shifting.
pub struct GatedBus<'g, B: DisplayBus> {
    bus: B,
    gate: &'g TransferGate,
}

impl<'g, B: DisplayBus> GatedBus<'g, B> {
    /// Wrap a bus
    pub fn new(bus: B, gate: &'g TransferGate) -> Self {
        Self { bus, gate }
    }

    /// The gate this bus reports to
    pub fn gate(&self) -> &'g TransferGate {
        self.gate
    }

    /// Complete the outstanding transfer if the bus has gone quiet
    ///
    /// Returns true if this call completed a transfer.
    pub fn poll_completion(&self) -> bool {
        if self.gate.is_busy() && !self.bus.is_busy() {
            self.gate.complete();
            true
        } else {
            false
        }
    }

    /// Block until no transfer is outstanding
    pub fn wait_idle(&self) {
        while self.gate.is_busy() {
            if !self.poll_completion() {
                core::hint::spin_loop();
            }
        }
    }

    /// Submit `words` as one transfer
    ///
    /// Waits for the previous transfer to complete first. On a bus error
    /// the gate is released before the error is returned.
    pub fn transfer(&mut self, words: &[u8]) -> Result<(), B::Error> {
        let bus = &self.bus;
        let gate = self.gate;
        gate.begin_blocking_with(|| {
            if !bus.is_busy() {
                gate.complete();
            }
        });

        for &word in words {
            if let Err(e) = self.bus.submit(u16::from(word)) {
                self.gate.complete();
                return Err(e);
            }
        }

        Ok(())
    }

    /// Reconfigure the bus between transfers
    pub fn configure(&mut self, config: &BusConfig) -> Result<(), B::Error> {
        self.wait_idle();
        self.bus.disable();
        self.bus.configure(config)?;
        self.bus.enable();
        Ok(())
    }

    /// Access the wrapped bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Unwrap the bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use std::sync::atomic::AtomicBool as StdAtomicBool;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct MockBus {
        words: Vec<u16>,
        busy_polls: Cell<u32>,
        enabled: bool,
        config: Option<BusConfig>,
        fail_after: Option<usize>,
    }

    impl DisplayBus for MockBus {
        type Error = ();

        fn configure(&mut self, config: &BusConfig) -> Result<(), ()> {
            assert!(!self.enabled);
            self.config = Some(*config);
            Ok(())
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn submit(&mut self, word: u16) -> Result<(), ()> {
            if self.fail_after == Some(self.words.len()) {
                return Err(());
            }
            self.words.push(word);
            self.busy_polls.set(2);
            Ok(())
        }

        fn is_busy(&self) -> bool {
            let left = self.busy_polls.get();
            if left > 0 {
                self.busy_polls.set(left - 1);
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn test_gate_transitions() {
        let gate = TransferGate::new();
        assert_eq!(gate.state(), GateState::Idle);

        assert_eq!(gate.try_begin(), Ok(()));
        assert_eq!(gate.state(), GateState::Busy);
        assert_eq!(gate.try_begin(), Err(GateBusy));

        gate.complete();
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(
            gate.stats(),
            GateStats {
                submitted: 1,
                completed: 1
            }
        );
    }

    #[test]
    fn test_complete_when_idle_is_harmless() {
        let gate = TransferGate::new();
        gate.complete();
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.stats().completed, 0);
    }

    #[test]
    fn test_submit_while_busy_waits_for_completion() {
        let gate = TransferGate::new();
        let proceeded = StdAtomicBool::new(false);
        gate.try_begin().unwrap();

        thread::scope(|s| {
            let waiter = s.spawn(|| {
                gate.begin_blocking();
                proceeded.store(true, std::sync::atomic::Ordering::SeqCst);
            });

            thread::sleep(Duration::from_millis(20));
            assert!(!proceeded.load(std::sync::atomic::Ordering::SeqCst));

            gate.complete();
            waiter.join().unwrap();
        });

        assert!(proceeded.load(std::sync::atomic::Ordering::SeqCst));
        assert!(gate.is_busy());
        assert_eq!(gate.stats().submitted, 2);
    }

    #[test]
    fn test_async_begin_when_idle() {
        let gate = TransferGate::new();
        embassy_futures::block_on(gate.begin());
        assert!(gate.is_busy());
    }

    #[test]
    fn test_async_begin_waits_for_completion() {
        let gate = TransferGate::new();
        gate.try_begin().unwrap();

        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(10));
                gate.complete();
            });
            embassy_futures::block_on(gate.begin());
        });

        assert!(gate.is_busy());
        assert_eq!(gate.stats().completed, 1);
    }

    #[test]
    fn test_gated_bus_completes_by_polling() {
        let gate = TransferGate::new();
        let mut bus = GatedBus::new(MockBus::default(), &gate);

        bus.transfer(&[0x15, 0x00, 0x3F]).unwrap();
        assert!(gate.is_busy());

        // Second transfer drains the first through the status fallback
        bus.transfer(&[0xAF]).unwrap();
        bus.wait_idle();

        assert!(!gate.is_busy());
        assert_eq!(bus.bus_mut().words, vec![0x15, 0x00, 0x3F, 0xAF]);
        assert_eq!(gate.stats().completed, 2);
    }

    #[test]
    fn test_gated_bus_releases_gate_on_error() {
        let gate = TransferGate::new();
        let mock = MockBus {
            fail_after: Some(1),
            ..MockBus::default()
        };
        let mut bus = GatedBus::new(mock, &gate);

        assert_eq!(bus.transfer(&[1, 2, 3]), Err(()));
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_configure_waits_and_reenables() {
        let gate = TransferGate::new();
        let mut bus = GatedBus::new(MockBus::default(), &gate);
        bus.transfer(&[1]).unwrap();

        let config = BusConfig::default();
        bus.configure(&config).unwrap();

        assert!(!gate.is_busy());
        let mock = bus.into_inner();
        assert!(mock.enabled);
        assert_eq!(mock.config, Some(config));
    }
}
