//! Interrupt-safe cell.
//!
//! Masks interrupts before handing out access to the inner value and
//! restores the previous interrupt state on release. On a single core this is
//! all the exclusion needed between the foreground and an interrupt handler,
//! so unlike a spin lock there is nothing to spin on.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use super::irq::IrqGuard;

/// A cell whose contents are only reachable with interrupts masked.
pub struct IrqCell<T> {
    borrowed: UnsafeCell<bool>,
    data: UnsafeCell<T>,
}

// SAFETY: Every access to `data` and `borrowed` happens inside an `IrqGuard`
// critical section on a single core, and `borrowed` rejects re-entry.
unsafe impl<T: Send> Send for IrqCell<T> {}
unsafe impl<T: Send> Sync for IrqCell<T> {}

impl<T> IrqCell<T> {
    /// Creates a new `IrqCell` wrapping `value`.
    pub const fn new(value: T) -> Self {
        Self {
            borrowed: UnsafeCell::new(false),
            data: UnsafeCell::new(value),
        }
    }

    /// Masks interrupts and borrows the contents.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already borrowed, which can only happen when the
    /// same cell is locked twice from one call chain.
    pub fn lock(&self) -> IrqCellGuard<'_, T> {
        let irq = IrqGuard::new();
        // SAFETY: Interrupts are masked, so nothing else can observe
        // `borrowed` between this read and write.
        unsafe {
            assert!(!*self.borrowed.get(), "IrqCell already borrowed");
            *self.borrowed.get() = true;
        }
        IrqCellGuard { cell: self, _irq: irq }
    }

    /// Runs `f` on the contents with interrupts masked.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    /// Returns a mutable reference without masking interrupts.
    ///
    /// The `&mut self` receiver proves nothing else can reach the cell.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

/// RAII guard that clears the borrow and restores interrupt state on drop.
pub struct IrqCellGuard<'a, T> {
    cell: &'a IrqCell<T>,
    // Dropped after `Drop::drop` runs, so the borrow flag is cleared with
    // interrupts still masked.
    _irq: IrqGuard,
}

impl<T> Deref for IrqCellGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: The guard holds the only borrow and interrupts are masked.
        unsafe { &*self.cell.data.get() }
    }
}

impl<T> DerefMut for IrqCellGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: The guard holds the only borrow and interrupts are masked.
        unsafe { &mut *self.cell.data.get() }
    }
}

impl<T> Drop for IrqCellGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: Interrupts are still masked by `_irq`.
        unsafe { *self.cell.borrowed.get() = false };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::interrupts_enabled;

    #[test]
    fn lock_masks_interrupts() {
        let cell = IrqCell::new(5u32);
        {
            let guard = cell.lock();
            assert_eq!(*guard, 5);
            assert!(!interrupts_enabled());
        }
        assert!(interrupts_enabled());
    }

    #[test]
    fn mutate_through_guard() {
        let cell = IrqCell::new(0u32);
        cell.with(|v| *v = 99);
        assert_eq!(*cell.lock(), 99);
    }

    #[test]
    fn relock_after_drop() {
        let cell = IrqCell::new(1u8);
        drop(cell.lock());
        assert_eq!(cell.with(|v| *v), 1);
    }

    #[test]
    #[should_panic(expected = "IrqCell already borrowed")]
    fn reentrant_lock_panics() {
        let cell = IrqCell::new(0u8);
        let _outer = cell.lock();
        let _inner = cell.lock();
    }

    #[test]
    fn get_mut_without_masking() {
        let mut cell = IrqCell::new(3u16);
        *cell.get_mut() += 1;
        assert!(interrupts_enabled());
        assert_eq!(*cell.lock(), 4);
    }
}
