//! Words shared between the foreground and an interrupt handler.
//!
//! Both types use a native atomic when the target has one of the right width.
//! Otherwise the word sits in an [`IrqCell`](super::IrqCell), so a multi-byte
//! load or store cannot be torn by the handler. AVR takes that path for
//! every word, and so does Cortex-M0 (`thumbv6m`), which has no
//! `target_has_atomic` widths at all.
//!
//! Building with `--cfg irqserial_force_irqcell` selects the `IrqCell` path
//! on any target, so the host tests can exercise it.

#[cfg(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell))))]
use super::loom_compat::AtomicU32;
#[cfg(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell))))]
use super::loom_compat::AtomicUsize;
use super::loom_compat::Ordering;

#[cfg(any(
    not(all(target_has_atomic = "32", target_has_atomic = "ptr")),
    irqserial_force_irqcell
))]
use super::IrqCell;

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// A wrapping 32-bit statistics counter.
///
/// Incremented by exactly one context; any context may read it. On the
/// atomic path the increment is a load followed by a store, not a
/// read-modify-write, and is exact only with a single writer.
pub struct Counter {
    #[cfg(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell))))]
    value: AtomicU32,
    #[cfg(not(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell)))))]
    value: IrqCell<u32>,
}

impl Counter {
    /// Creates a counter starting at zero.
    #[cfg(not(loom))]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(all(target_has_atomic = "32", not(irqserial_force_irqcell)))]
            value: AtomicU32::new(0),
            #[cfg(any(not(target_has_atomic = "32"), irqserial_force_irqcell))]
            value: IrqCell::new(0),
        }
    }

    /// Creates a counter starting at zero.
    #[cfg(loom)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: AtomicU32::new(0),
        }
    }

    /// Returns the current count.
    #[must_use]
    #[inline]
    pub fn get(&self) -> u32 {
        #[cfg(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell))))]
        {
            self.value.load(Ordering::Relaxed)
        }
        #[cfg(not(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell)))))]
        {
            self.value.with(|v| *v)
        }
    }

    /// Adds one, wrapping at `u32::MAX`.
    ///
    /// Must only be called from the counter's single writing context.
    #[inline]
    pub fn increment(&self) {
        #[cfg(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell))))]
        {
            let next = self.value.load(Ordering::Relaxed).wrapping_add(1);
            self.value.store(next, Ordering::Relaxed);
        }
        #[cfg(not(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell)))))]
        {
            self.value.with(|v| *v = v.wrapping_add(1));
        }
    }

    /// Resets the count to zero.
    ///
    /// The caller must ensure the writing context cannot run concurrently,
    /// e.g. by holding an [`IrqGuard`](super::IrqGuard).
    #[inline]
    pub fn reset(&self) {
        #[cfg(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell))))]
        {
            self.value.store(0, Ordering::Relaxed);
        }
        #[cfg(not(any(loom, all(target_has_atomic = "32", not(irqserial_force_irqcell)))))]
        {
            self.value.with(|v| *v = 0);
        }
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Counter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Counter").field(&self.get()).finish()
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// A queue position published by one context and observed by the other.
pub(crate) struct Index {
    #[cfg(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell))))]
    value: AtomicUsize,
    #[cfg(not(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell)))))]
    value: IrqCell<usize>,
}

impl Index {
    #[cfg(not(loom))]
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(all(target_has_atomic = "ptr", not(irqserial_force_irqcell)))]
            value: AtomicUsize::new(0),
            #[cfg(any(not(target_has_atomic = "ptr"), irqserial_force_irqcell))]
            value: IrqCell::new(0),
        }
    }

    #[cfg(loom)]
    pub(crate) fn new() -> Self {
        Self {
            value: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub(crate) fn load(&self, order: Ordering) -> usize {
        #[cfg(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell))))]
        {
            self.value.load(order)
        }
        #[cfg(not(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell)))))]
        {
            let value = self.value.with(|v| *v);
            if order != Ordering::Relaxed {
                core::sync::atomic::compiler_fence(order);
            }
            value
        }
    }

    #[inline]
    pub(crate) fn store(&self, value: usize, order: Ordering) {
        #[cfg(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell))))]
        {
            self.value.store(value, order);
        }
        #[cfg(not(any(loom, all(target_has_atomic = "ptr", not(irqserial_force_irqcell)))))]
        {
            if order != Ordering::Relaxed {
                core::sync::atomic::compiler_fence(order);
            }
            self.value.with(|v| *v = value);
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    #[test]
    fn counter_counts_and_resets() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.increment();
        counter.increment();
        assert_eq!(counter.get(), 2);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn counter_wraps() {
        let counter = Counter::new();
        #[cfg(not(irqserial_force_irqcell))]
        counter.value.store(u32::MAX, Ordering::Relaxed);
        #[cfg(irqserial_force_irqcell)]
        counter.value.with(|v| *v = u32::MAX);
        counter.increment();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn access_restores_interrupt_state() {
        use crate::sync::{IrqGuard, interrupts_enabled};

        let counter = Counter::new();
        let index = Index::new();
        assert!(interrupts_enabled());
        counter.increment();
        index.store(1, Ordering::Release);
        assert!(interrupts_enabled());

        let guard = IrqGuard::new();
        counter.increment();
        assert_eq!(index.load(Ordering::Acquire), 1);
        assert!(!interrupts_enabled());
        drop(guard);

        assert!(interrupts_enabled());
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn index_round_trips() {
        let index = Index::new();
        index.store(5, Ordering::Release);
        assert_eq!(index.load(Ordering::Acquire), 5);
    }
}
