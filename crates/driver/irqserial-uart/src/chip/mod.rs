//! Per-family register layouts.
//!
//! Each module implements [`UartPeripheral`](crate::UartPeripheral) or
//! [`InterruptController`](crate::InterruptController) for one chip family.
//! Pick the one matching the target at build time; the driver core is the
//! same for all of them.

#[cfg(feature = "avr")]
pub mod avr;
#[cfg(feature = "stm32")]
pub mod nvic;
#[cfg(feature = "stm32")]
pub mod stm32;
