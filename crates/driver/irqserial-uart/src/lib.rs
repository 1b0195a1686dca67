//! Interrupt-driven, non-blocking UART driver.
//!
//! One UART channel, two fixed-size byte queues and an interrupt handler that
//! shuttles bytes between them and the data register. The foreground never
//! waits for the line: [`Uart::send_byte`] fails with [`QueueFull`] when the
//! transmit queue is saturated and [`Uart::receive_byte`] returns `None` when
//! nothing has arrived.
//!
//! The driver is chip-neutral. A [`UartPeripheral`] implementation supplies
//! the registers (see [`chip`] for STM32F1 and ATmega USARTs) and an
//! [`InterruptController`] unmasks the UART's interrupt source.
//!
//! All state lives in an explicit [`Uart`] context, `const`-constructible so
//! it can sit in a `static` shared with the interrupt vector.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod chip;
pub mod config;
pub mod error;
pub mod hw;
pub mod uart;

#[cfg(test)]
mod mock;

pub use config::{UartConfig, baud_divisor};
pub use error::{ConfigError, QueueFull};
pub use hw::{Control, InterruptController, NoController, Status, UartPeripheral};
pub use uart::{Uart, UartWriter};
