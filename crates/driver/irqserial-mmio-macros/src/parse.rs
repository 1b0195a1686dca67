//! Parsing for the `register_block!` DSL.

use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitInt, Path, Token, Visibility, braced, bracketed};

/// A complete register block definition.
pub struct RegisterBlock {
    /// Attributes on the struct (docs, derives).
    pub attrs: Vec<Attribute>,
    /// Visibility of the generated struct.
    pub vis: Visibility,
    /// Name of the generated struct.
    pub name: Ident,
    /// Register definitions, in source order.
    pub registers: Vec<RegisterDef>,
}

/// Access mode for a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only: reader only.
    ReadOnly,
    /// Write-only: writer only.
    WriteOnly,
    /// Read-write: reader, writer and read-modify-write helper.
    ReadWrite,
}

/// Width of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWidth {
    /// 8-bit register (AVR).
    U8,
    /// 16-bit register.
    U16,
    /// 32-bit register (Cortex-M peripherals).
    U32,
}

impl RegWidth {
    /// Returns the Rust type name for this width.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
        }
    }

    /// Returns the access size in bytes.
    pub fn bytes(self) -> u64 {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// A single register definition.
pub struct RegisterDef {
    /// Attributes on this register (docs).
    pub attrs: Vec<Attribute>,
    /// Byte offset from base.
    pub offset: LitInt,
    /// Register width.
    pub width: RegWidth,
    /// Access mode.
    pub access: AccessMode,
    /// Register name (used for method names).
    pub name: Ident,
    /// Optional bitflags type carried by the register.
    pub bitflags_type: Option<Path>,
}

impl Parse for RegisterBlock {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        let name: Ident = input.parse()?;

        let content;
        braced!(content in input);

        let mut registers: Vec<RegisterDef> = Vec::new();
        while !content.is_empty() {
            let reg = content.call(parse_register)?;
            if registers.iter().any(|r| r.name == reg.name) {
                return Err(syn::Error::new(
                    reg.name.span(),
                    format!("register `{}` defined twice", reg.name),
                ));
            }
            registers.push(reg);
        }

        Ok(Self {
            attrs,
            vis,
            name,
            registers,
        })
    }
}

/// Parses one `[offset; width; access] name => Type,` line.
fn parse_register(input: ParseStream) -> syn::Result<RegisterDef> {
    let attrs = input.call(Attribute::parse_outer)?;

    let bracket_content;
    bracketed!(bracket_content in input);

    let offset: LitInt = bracket_content.parse()?;
    bracket_content.parse::<Token![;]>()?;

    let width_ident: Ident = bracket_content.parse()?;
    let width = match width_ident.to_string().as_str() {
        "u8" => RegWidth::U8,
        "u16" => RegWidth::U16,
        "u32" => RegWidth::U32,
        _ => {
            return Err(syn::Error::new(
                width_ident.span(),
                "expected register width: u8, u16, or u32",
            ));
        }
    };

    let offset_value: u64 = offset.base10_parse()?;
    if offset_value % width.bytes() != 0 {
        return Err(syn::Error::new(
            offset.span(),
            format!(
                "offset {offset_value:#x} is not aligned to the {}-byte register width",
                width.bytes()
            ),
        ));
    }

    bracket_content.parse::<Token![;]>()?;

    let access_ident: Ident = bracket_content.parse()?;
    let access = match access_ident.to_string().as_str() {
        "ro" => AccessMode::ReadOnly,
        "wo" => AccessMode::WriteOnly,
        "rw" => AccessMode::ReadWrite,
        _ => {
            return Err(syn::Error::new(
                access_ident.span(),
                "expected access mode: ro, wo, or rw",
            ));
        }
    };

    let name: Ident = input.parse()?;

    let bitflags_type = if input.peek(Token![=>]) {
        input.parse::<Token![=>]>()?;
        Some(input.parse::<Path>()?)
    } else {
        None
    };

    if !input.is_empty() {
        input.parse::<Token![,]>()?;
    }

    Ok(RegisterDef {
        attrs,
        offset,
        width,
        access,
        name,
        bitflags_type,
    })
}
