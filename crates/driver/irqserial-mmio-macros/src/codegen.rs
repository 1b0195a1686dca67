//! Code generation for the `register_block!` macro.
//!
//! Turns a parsed register block into a `Copy` struct holding the block's
//! base address, with one volatile accessor per register direction.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::parse::{AccessMode, RegisterBlock, RegisterDef};

/// Generates the complete output for a register block definition.
pub fn generate(block: &RegisterBlock) -> TokenStream {
    let vis = &block.vis;
    let name = &block.name;
    let attrs = &block.attrs;

    let methods: Vec<TokenStream> = block.registers.iter().map(generate_methods).collect();

    quote! {
        #(#attrs)*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #vis struct #name {
            base: usize,
        }

        impl #name {
            /// Creates a register block accessor at `base`.
            ///
            /// # Safety
            ///
            /// `base` must be the address of this peripheral's register
            /// window, valid for volatile access at every defined offset for
            /// as long as the accessor is used.
            #[must_use]
            #vis const unsafe fn new(base: usize) -> Self {
                Self { base }
            }

            /// Returns the base address.
            #[must_use]
            #vis const fn base(&self) -> usize {
                self.base
            }

            #(#methods)*
        }
    }
}

/// Generates the accessor methods for a single register.
fn generate_methods(reg: &RegisterDef) -> TokenStream {
    let mut methods = TokenStream::new();

    if reg.access != AccessMode::WriteOnly {
        methods.extend(generate_read(reg));
    }
    if reg.access != AccessMode::ReadOnly {
        methods.extend(generate_write(reg));
    }
    if reg.access == AccessMode::ReadWrite {
        methods.extend(generate_modify(reg));
    }

    methods
}

/// Generates `fn name(&self) -> T`.
fn generate_read(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let offset = &reg.offset;
    let width_ty = width_type(reg);
    let attrs = &reg.attrs;

    let raw = quote! {
        // SAFETY: Caller of `new` guarantees `base` maps this register window.
        unsafe { core::ptr::read_volatile((self.base + #offset) as *const #width_ty) }
    };

    match reg.bitflags_type {
        Some(ref bf_type) => quote! {
            #(#attrs)*
            #[inline]
            #[must_use]
            pub fn #name(&self) -> #bf_type {
                #bf_type::from_bits_retain(#raw)
            }
        },
        None => quote! {
            #(#attrs)*
            #[inline]
            #[must_use]
            pub fn #name(&self) -> #width_ty {
                #raw
            }
        },
    }
}

/// Generates `fn set_name(&self, value: T)`.
fn generate_write(reg: &RegisterDef) -> TokenStream {
    let setter_name = format_ident!("set_{}", reg.name);
    let offset = &reg.offset;
    let width_ty = width_type(reg);
    let set_doc = format!("Writes the `{}` register.", reg.name);

    let (value_ty, bits) = match reg.bitflags_type {
        Some(ref bf_type) => (quote! { #bf_type }, quote! { value.bits() }),
        None => (quote! { #width_ty }, quote! { value }),
    };

    quote! {
        #[doc = #set_doc]
        #[inline]
        pub fn #setter_name(&self, value: #value_ty) {
            // SAFETY: Caller of `new` guarantees `base` maps this register window.
            unsafe {
                core::ptr::write_volatile((self.base + #offset) as *mut #width_ty, #bits);
            }
        }
    }
}

/// Generates `fn modify_name(&self, f)`, a read-modify-write of the register.
fn generate_modify(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let modify_name = format_ident!("modify_{}", reg.name);
    let setter_name = format_ident!("set_{}", reg.name);
    let width_ty = width_type(reg);
    let modify_doc = format!(
        "Read-modify-writes the `{}` register. Not atomic with respect to \
         interrupt handlers that write the same register.",
        reg.name
    );

    let value_ty = match reg.bitflags_type {
        Some(ref bf_type) => quote! { #bf_type },
        None => quote! { #width_ty },
    };

    quote! {
        #[doc = #modify_doc]
        #[inline]
        pub fn #modify_name(&self, f: impl FnOnce(#value_ty) -> #value_ty) {
            self.#setter_name(f(self.#name()));
        }
    }
}

/// Returns the token stream for the register's width type.
fn width_type(reg: &RegisterDef) -> TokenStream {
    let ident = format_ident!("{}", reg.width.type_name());
    quote! { #ident }
}
