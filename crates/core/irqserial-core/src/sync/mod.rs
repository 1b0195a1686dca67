//! Synchronization between the foreground and a single interrupt handler.
//!
//! Provides [`IrqGuard`] (a scoped interrupt-masked critical section),
//! [`IrqCell`] for data that must only be touched with interrupts masked, and
//! [`Counter`] for statistics written by one context and read by any.

mod irq;
mod irq_cell;
mod word;

pub(crate) mod loom_compat;

pub use irq::{
    IrqGuard, IrqState, interrupts_enabled, restore, save_and_disable, without_interrupts,
};
pub use irq_cell::{IrqCell, IrqCellGuard};
pub use word::Counter;

pub(crate) use word::Index;
