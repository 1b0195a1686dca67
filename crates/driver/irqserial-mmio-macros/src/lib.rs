//! Proc-macro crate for the `register_block!` MMIO register DSL.
//!
//! Generates typed, safe register accessors from a declarative definition.
//! The single `unsafe` point is the struct's `const unsafe fn new(base)`; all
//! generated read/write/modify methods are safe.

mod codegen;
mod parse;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use crate::parse::RegisterBlock;

/// Generates a typed MMIO register block struct with safe accessors.
///
/// # Syntax
///
/// ```ignore
/// register_block! {
///     /// Doc comment for the struct.
///     pub StructName {
///         /// Doc comment for the register.
///         [offset; width; access_mode] name => OptionalBitflagsType,
///     }
/// }
/// ```
///
/// - `offset`: byte offset from base, aligned to `width`
/// - `width`: `u8`, `u16`, or `u32`
/// - `access_mode`: `ro` (read-only), `wo` (write-only), `rw` (read-write)
/// - `=> Type`: optional bitflags type (needs `from_bits_retain` and `.bits()`)
///
/// # Generated Code
///
/// - `ro`/`rw`: `fn name(&self) -> Type`
/// - `wo`/`rw`: `fn set_name(&self, value: Type)`
/// - `rw`: `fn modify_name(&self, f: impl FnOnce(Type) -> Type)`
///
/// # Example
///
/// ```ignore
/// use irqserial_mmio::register_block;
///
/// register_block! {
///     /// STM32F1 USART.
///     pub UsartRegs {
///         /// Status register.
///         [0x00; u32; rw] sr => Sr,
///         /// Data register.
///         [0x04; u32; rw] dr,
///         /// Baud rate register.
///         [0x08; u32; rw] brr,
///     }
/// }
/// ```
#[proc_macro]
pub fn register_block(input: TokenStream) -> TokenStream {
    let block = parse_macro_input!(input as RegisterBlock);
    codegen::generate(&block).into()
}
