//! Typed MMIO register block abstractions.
//!
//! This crate re-exports the [`register_block!`] macro from
//! `irqserial-mmio-macros`, which generates safe, typed register accessor
//! structs from a declarative definition. The generated code consolidates all
//! `unsafe` volatile access into the struct's `new()` constructor, making all
//! individual register reads and writes safe.
//!
//! # Example
//!
//! ```ignore
//! use irqserial_mmio::register_block;
//!
//! register_block! {
//!     /// ATmega USART0.
//!     pub Usart0 {
//!         /// Control and status register A.
//!         [0x00; u8; rw] ucsra,
//!         /// Data register.
//!         [0x06; u8; rw] udr,
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub use irqserial_mmio_macros::register_block;
