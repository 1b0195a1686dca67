//! Interrupt masking.
//!
//! [`IrqGuard`] disables interrupts on creation and restores the previous
//! interrupt state when dropped. It never unconditionally re-enables: a guard
//! taken while interrupts were already off leaves them off, so guards nest.
//!
//! Supported masking back-ends:
//!
//! | Target | Saved state | Disable | Restore |
//! |--------|-------------|---------|---------|
//! | Cortex-M (`arm`, bare metal) | `PRIMASK` | `cpsid i` | `cpsie i` if it was clear |
//! | AVR (bare metal) | `SREG` | `cli` | write `SREG` back |
//! | Hosted, `std` feature or tests | per-thread flag | clear flag | write flag back |
//! | Hosted, otherwise | nothing | no-op | no-op |
//!
//! The hosted flag lets driver tests observe whether a foreground operation
//! really ran masked.

use core::marker::PhantomData;
use core::sync::atomic::{Ordering, compiler_fence};

/// Saved interrupt state, as returned by [`save_and_disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqState(RawState);

/// An RAII critical section: interrupts stay masked while it is alive.
///
/// Not `Send`: the saved state belongs to the CPU (or host thread) that
/// created the guard.
///
/// # Example
///
/// ```ignore
/// let _guard = IrqGuard::new();
/// // the UART handler cannot run here
/// ```
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct IrqGuard {
    saved: IrqState,
    _not_send: PhantomData<*mut ()>,
}

impl IrqGuard {
    /// Saves the current interrupt state and masks interrupts.
    #[inline]
    pub fn new() -> Self {
        Self {
            saved: save_and_disable(),
            _not_send: PhantomData,
        }
    }

    /// Returns the interrupt state that will be restored on drop.
    #[must_use]
    pub fn saved_state(&self) -> IrqState {
        self.saved
    }
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IrqGuard {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: `saved` was produced by `save_and_disable` on this CPU and
        // guards are dropped in reverse creation order (they are !Send and
        // scoped), so restoring it returns to the state before this guard.
        unsafe { restore(self.saved) };
    }
}

/// Runs `f` with interrupts masked, restoring the previous state afterwards.
#[inline]
pub fn without_interrupts<R>(f: impl FnOnce(&IrqGuard) -> R) -> R {
    let guard = IrqGuard::new();
    f(&guard)
}

/// Returns `true` if interrupts are currently enabled.
#[must_use]
#[inline]
pub fn interrupts_enabled() -> bool {
    arch::enabled(arch::read())
}

impl IrqState {
    /// Returns `true` if interrupts were enabled when this state was saved.
    #[must_use]
    pub fn was_enabled(self) -> bool {
        arch::enabled(self.0)
    }
}

/// Saves the current interrupt state and masks interrupts.
///
/// Prefer [`IrqGuard`], which pairs this with [`restore`] automatically.
#[inline]
pub fn save_and_disable() -> IrqState {
    let state = arch::save_and_disable();
    compiler_fence(Ordering::SeqCst);
    IrqState(state)
}

/// Restores a state previously returned by [`save_and_disable`].
///
/// # Safety
///
/// `state` must come from the matching [`save_and_disable`] on the same CPU,
/// and any critical sections opened after it must already be closed.
/// Restoring out of order can re-enable interrupts inside an outer critical
/// section.
#[inline]
pub unsafe fn restore(state: IrqState) {
    compiler_fence(Ordering::SeqCst);
    // SAFETY: Forwarded from the caller.
    unsafe { arch::restore(state.0) };
}

#[cfg(all(target_os = "none", not(any(target_arch = "arm", target_arch = "avr"))))]
compile_error!("irqserial-core: no interrupt masking back-end for this architecture");

// ---------------------------------------------------------------------------
// Cortex-M
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "none", target_arch = "arm"))]
type RawState = u32;

#[cfg(all(target_os = "none", target_arch = "arm"))]
mod arch {
    use super::RawState;

    const PRIMASK_PM: u32 = 1 << 0;

    #[inline]
    pub(super) fn read() -> RawState {
        let primask: u32;
        // SAFETY: Reading PRIMASK has no side effects.
        unsafe {
            core::arch::asm!(
                "mrs {}, PRIMASK",
                out(reg) primask,
                options(nomem, nostack, preserves_flags),
            );
        }
        primask
    }

    #[inline]
    pub(super) fn enabled(state: RawState) -> bool {
        state & PRIMASK_PM == 0
    }

    #[inline]
    pub(super) fn save_and_disable() -> RawState {
        let primask: u32;
        // SAFETY: Masking interrupts is always sound; the memory clobber
        // keeps accesses from being hoisted out of the critical section.
        unsafe {
            core::arch::asm!(
                "mrs {}, PRIMASK",
                "cpsid i",
                out(reg) primask,
                options(nostack, preserves_flags),
            );
        }
        primask
    }

    #[inline]
    pub(super) unsafe fn restore(state: RawState) {
        if enabled(state) {
            // SAFETY: Interrupts were enabled when `state` was saved.
            unsafe {
                core::arch::asm!("cpsie i", options(nostack, preserves_flags));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AVR
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "none", target_arch = "avr"))]
type RawState = u8;

#[cfg(all(target_os = "none", target_arch = "avr"))]
mod arch {
    use super::RawState;

    /// Global interrupt enable bit in SREG.
    const SREG_I: u8 = 1 << 7;

    #[inline]
    pub(super) fn read() -> RawState {
        let sreg: u8;
        // SAFETY: Reading SREG has no side effects.
        unsafe {
            core::arch::asm!("in {}, 0x3F", out(reg) sreg, options(nomem, nostack));
        }
        sreg
    }

    #[inline]
    pub(super) fn enabled(state: RawState) -> bool {
        state & SREG_I != 0
    }

    #[inline]
    pub(super) fn save_and_disable() -> RawState {
        let sreg: u8;
        // SAFETY: Clearing the I flag is always sound.
        unsafe {
            core::arch::asm!("in {}, 0x3F", "cli", out(reg) sreg, options(nostack));
        }
        sreg
    }

    #[inline]
    pub(super) unsafe fn restore(state: RawState) {
        // SAFETY: Writes back the SREG value saved by `save_and_disable`.
        unsafe {
            core::arch::asm!("out 0x3F, {}", in(reg) state, options(nostack));
        }
    }
}

// ---------------------------------------------------------------------------
// Hosted, simulated
// ---------------------------------------------------------------------------

#[cfg(all(not(target_os = "none"), any(test, feature = "std")))]
type RawState = bool;

#[cfg(all(not(target_os = "none"), any(test, feature = "std")))]
mod arch {
    extern crate std;

    use core::cell::Cell;

    use super::RawState;

    std::thread_local! {
        static ENABLED: Cell<bool> = const { Cell::new(true) };
    }

    pub(super) fn read() -> RawState {
        ENABLED.with(Cell::get)
    }

    pub(super) fn enabled(state: RawState) -> bool {
        state
    }

    pub(super) fn save_and_disable() -> RawState {
        ENABLED.with(|flag| flag.replace(false))
    }

    pub(super) unsafe fn restore(state: RawState) {
        ENABLED.with(|flag| flag.set(state));
    }
}

// ---------------------------------------------------------------------------
// Hosted, no-op
// ---------------------------------------------------------------------------

#[cfg(all(not(target_os = "none"), not(any(test, feature = "std"))))]
type RawState = ();

#[cfg(all(not(target_os = "none"), not(any(test, feature = "std"))))]
mod arch {
    use super::RawState;

    pub(super) fn read() -> RawState {}

    pub(super) fn enabled((): RawState) -> bool {
        true
    }

    pub(super) fn save_and_disable() -> RawState {}

    pub(super) unsafe fn restore((): RawState) {}
}
