//! Fixed-capacity byte FIFO shared between two execution contexts.
//!
//! This module provides [`Fifo`], a circular byte queue with one producer and
//! one consumer that may run in different contexts (the foreground and an
//! interrupt handler) without a lock.
//!
//! # Capacity
//!
//! The backing array holds `N` bytes but the usable capacity is `N - 1`. One
//! slot stays empty so that `write == read` always means empty and
//! `write + 1 == read` (mod `N`) always means full.
//!
//! # Ownership of the indices
//!
//! The write index is only ever advanced by the [`Producer`], the read index
//! only by the [`Consumer`]. Each side publishes its index with `Release`
//! after touching the slot and observes the other side's index with
//! `Acquire`, so a consumer never reads a slot before the producer's write to
//! it is visible, and a producer never overwrites a slot the consumer is
//! still reading.
//!
//! # Examples
//!
//! ```ignore
//! use irqserial_core::fifo::Fifo;
//!
//! let mut fifo = Fifo::<4>::new();
//! let (mut tx, mut rx) = fifo.split();
//!
//! assert!(tx.try_push(b'A'));
//! assert!(tx.try_push(b'B'));
//! assert!(tx.try_push(b'C'));
//! assert!(!tx.try_push(b'D')); // 3 usable slots
//!
//! assert_eq!(rx.try_pop(), Some(b'A'));
//! ```

use core::fmt;

use crate::sync::Index;
use crate::sync::loom_compat::{Ordering, UnsafeCell};

/// Returns the position after `i` in a ring of `n` slots.
///
/// A compare-and-reset instead of `%`: constrained cores have no divider.
#[inline]
const fn advance(i: usize, n: usize) -> usize {
    let next = i + 1;
    if next >= n { 0 } else { next }
}

/// A circular byte queue with `N - 1` usable slots.
pub struct Fifo<const N: usize> {
    buf: [UnsafeCell<u8>; N],
    /// Write index, advanced by the producer.
    head: Index,
    /// Read index, advanced by the consumer.
    tail: Index,
}

// SAFETY: Slots are only written by the single producer at `head` and only
// read by the single consumer at `tail`, and the Release/Acquire pair on the
// indices orders those accesses. Obtaining more than one producer or consumer
// requires `unsafe` (`producer`/`consumer`) or `&mut self` (`split`).
unsafe impl<const N: usize> Sync for Fifo<N> {}

impl<const N: usize> Fifo<N> {
    /// The size of the backing array. The usable capacity is `N - 1`.
    pub const SIZE: usize = N;

    const SIZE_OK: () = assert!(N >= 2, "Fifo needs at least two slots");

    /// Creates an empty FIFO. Does not allocate.
    #[cfg(not(loom))]
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::SIZE_OK;
        Self {
            buf: [const { UnsafeCell::new(0) }; N],
            head: Index::new(),
            tail: Index::new(),
        }
    }

    /// Creates an empty FIFO.
    #[cfg(loom)]
    #[must_use]
    pub fn new() -> Self {
        let () = Self::SIZE_OK;
        Self {
            buf: core::array::from_fn(|_| UnsafeCell::new(0)),
            head: Index::new(),
            tail: Index::new(),
        }
    }

    /// Returns the maximum number of bytes the FIFO can hold (`N - 1`).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Returns `true` if there is nothing to pop.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Returns `true` if a push would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        advance(self.head.load(Ordering::Acquire), N) == self.tail.load(Ordering::Acquire)
    }

    /// Returns the number of queued bytes.
    ///
    /// When the other side is running concurrently this is a snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail { head - tail } else { head + N - tail }
    }

    /// Splits the FIFO into its producer and consumer halves.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let fifo: &Self = self;
        (Producer { fifo }, Consumer { fifo })
    }

    /// Returns a producer handle for a shared FIFO.
    ///
    /// # Safety
    ///
    /// At most one producer for this FIFO may be in use at any time, and it
    /// must only be used from one execution context at a time.
    #[must_use]
    pub unsafe fn producer(&self) -> Producer<'_, N> {
        Producer { fifo: self }
    }

    /// Returns a consumer handle for a shared FIFO.
    ///
    /// # Safety
    ///
    /// At most one consumer for this FIFO may be in use at any time, and it
    /// must only be used from one execution context at a time.
    #[must_use]
    pub unsafe fn consumer(&self) -> Consumer<'_, N> {
        Consumer { fifo: self }
    }

    /// Discards all queued bytes.
    ///
    /// # Safety
    ///
    /// Neither the producer nor the consumer may run concurrently, e.g. the
    /// caller holds an [`IrqGuard`](crate::sync::IrqGuard) and the interrupt
    /// handler is the other side.
    pub unsafe fn clear(&self) {
        self.tail.store(0, Ordering::Release);
        self.head.store(0, Ordering::Release);
    }
}

impl<const N: usize> Default for Fifo<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for Fifo<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fifo")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

/// The writing half of a [`Fifo`].
pub struct Producer<'a, const N: usize> {
    fifo: &'a Fifo<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Appends `byte`.
    ///
    /// Returns `false` without modifying the queue if it is full; unread data
    /// is never overwritten.
    pub fn try_push(&mut self, byte: u8) -> bool {
        let head = self.fifo.head.load(Ordering::Relaxed);
        let next = advance(head, N);
        if next == self.fifo.tail.load(Ordering::Acquire) {
            return false;
        }

        // SAFETY: `head` is outside `tail..head`, so the consumer does not
        // read this slot until the store below publishes it.
        self.fifo.buf[head].with_mut(|slot| unsafe { *slot = byte });
        self.fifo.head.store(next, Ordering::Release);
        true
    }

    /// Returns `true` if the next push would fail.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.fifo.is_full()
    }
}

/// The reading half of a [`Fifo`].
pub struct Consumer<'a, const N: usize> {
    fifo: &'a Fifo<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Removes and returns the oldest byte, or `None` if the queue is empty.
    ///
    /// An empty queue is left untouched.
    pub fn try_pop(&mut self) -> Option<u8> {
        let tail = self.fifo.tail.load(Ordering::Relaxed);
        if tail == self.fifo.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `tail != head`, so the producer published this slot and
        // will not reuse it until the store below releases it.
        let byte = self.fifo.buf[tail].with(|slot| unsafe { *slot });
        self.fifo.tail.store(advance(tail, N), Ordering::Release);
        Some(byte)
    }

    /// Returns `true` if there is nothing to pop.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Returns the number of bytes waiting to be popped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fifo.len()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let fifo = Fifo::<16>::new();
        assert!(fifo.is_empty());
        assert!(!fifo.is_full());
        assert_eq!(fifo.len(), 0);
        assert_eq!(fifo.capacity(), 15);
    }

    #[test]
    fn advance_wraps_without_modulo() {
        assert_eq!(advance(0, 4), 1);
        assert_eq!(advance(2, 4), 3);
        assert_eq!(advance(3, 4), 0);
        assert_eq!(advance(4, 5), 0);
    }

    #[test]
    fn push_pop_fifo_order() {
        let mut fifo = Fifo::<8>::new();
        let (mut tx, mut rx) = fifo.split();
        assert!(tx.try_push(1));
        assert!(tx.try_push(2));
        assert!(tx.try_push(3));
        assert_eq!(rx.len(), 3);
        assert_eq!(rx.try_pop(), Some(1));
        assert_eq!(rx.try_pop(), Some(2));
        assert_eq!(rx.try_pop(), Some(3));
        assert_eq!(rx.try_pop(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn full_push_leaves_state_unchanged() {
        let mut fifo = Fifo::<4>::new();
        {
            let (mut tx, _) = fifo.split();
            assert!(tx.try_push(b'A'));
            assert!(tx.try_push(b'B'));
            assert!(tx.try_push(b'C'));
            assert!(tx.is_full());
            assert!(!tx.try_push(b'D'));
            assert!(!tx.try_push(b'E'));
        }
        assert_eq!(fifo.len(), 3);
        let (_, mut rx) = fifo.split();
        assert_eq!(rx.try_pop(), Some(b'A'));
        assert_eq!(rx.try_pop(), Some(b'B'));
        assert_eq!(rx.try_pop(), Some(b'C'));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn empty_pop_leaves_state_unchanged() {
        let mut fifo = Fifo::<4>::new();
        let (mut tx, mut rx) = fifo.split();
        assert_eq!(rx.try_pop(), None);
        assert_eq!(rx.try_pop(), None);
        assert!(tx.try_push(9));
        assert_eq!(rx.try_pop(), Some(9));
    }

    #[test]
    fn len_across_wrap() {
        let mut fifo = Fifo::<4>::new();
        let (mut tx, mut rx) = fifo.split();
        assert!(tx.try_push(1));
        assert!(tx.try_push(2));
        assert_eq!(rx.try_pop(), Some(1));
        assert_eq!(rx.try_pop(), Some(2));
        // Indices are now at 2; the next two pushes straddle the wrap.
        assert!(tx.try_push(3));
        assert!(tx.try_push(4));
        assert!(tx.try_push(5));
        assert_eq!(rx.len(), 3);
        assert!(tx.is_full());
    }

    #[test]
    fn wrap_around_multiple_times() {
        let mut fifo = Fifo::<4>::new();
        let (mut tx, mut rx) = fifo.split();
        for round in 0u8..5 {
            assert!(tx.try_push(round * 3));
            assert!(tx.try_push(round * 3 + 1));
            assert!(tx.try_push(round * 3 + 2));
            assert_eq!(rx.try_pop(), Some(round * 3));
            assert_eq!(rx.try_pop(), Some(round * 3 + 1));
            assert_eq!(rx.try_pop(), Some(round * 3 + 2));
            assert!(rx.is_empty());
        }
    }

    #[test]
    fn non_power_of_two_size() {
        let mut fifo = Fifo::<5>::new();
        let (mut tx, mut rx) = fifo.split();
        for round in 0u8..7 {
            for i in 0..4 {
                assert!(tx.try_push(round + i));
            }
            assert!(!tx.try_push(0xFF));
            for i in 0..4 {
                assert_eq!(rx.try_pop(), Some(round + i));
            }
        }
    }

    #[test]
    fn clear_discards_contents() {
        let fifo = Fifo::<8>::new();
        // SAFETY: The test is the only user of the FIFO.
        let mut tx = unsafe { fifo.producer() };
        assert!(tx.try_push(1));
        assert!(tx.try_push(2));
        // SAFETY: No producer or consumer is running concurrently.
        unsafe { fifo.clear() };
        assert!(fifo.is_empty());
        // SAFETY: As above.
        let mut rx = unsafe { fifo.consumer() };
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn static_fifo_is_const_constructible() {
        static FIFO: Fifo<16> = Fifo::new();
        assert!(FIFO.is_empty());
    }

    // The `IrqCell` path only excludes an interrupt handler on one core.
    #[cfg(not(irqserial_force_irqcell))]
    #[test]
    fn threads_preserve_order() {
        let fifo = Fifo::<16>::new();
        std::thread::scope(|s| {
            s.spawn(|| {
                // SAFETY: This thread is the only producer.
                let mut tx = unsafe { fifo.producer() };
                for byte in 0..=255u8 {
                    while !tx.try_push(byte) {
                        std::hint::spin_loop();
                    }
                }
            });
            // SAFETY: This thread is the only consumer.
            let mut rx = unsafe { fifo.consumer() };
            for expected in 0..=255u8 {
                loop {
                    if let Some(byte) = rx.try_pop() {
                        assert_eq!(byte, expected);
                        break;
                    }
                    std::hint::spin_loop();
                }
            }
        });
        assert!(fifo.is_empty());
    }
}
