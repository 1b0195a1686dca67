//! Core primitives for the irqserial UART driver.
//!
//! This crate holds the pieces of the driver that do not touch hardware
//! registers: the fixed-capacity byte [`Fifo`](fifo::Fifo) shared between the
//! foreground and the interrupt handler, and the interrupt-masking
//! [`IrqGuard`](sync::IrqGuard) that makes foreground accesses to that state
//! atomic with respect to the handler.
//!
//! By living outside the driver crate, these types can be tested with
//! `cargo test` and loom on the host without a microcontroller target.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(
    all(target_arch = "avr", target_os = "none"),
    feature(asm_experimental_arch)
)]
#![warn(missing_docs)]

pub mod fifo;
pub mod static_assert;
pub mod sync;
