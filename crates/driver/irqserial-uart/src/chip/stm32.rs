//! STM32F1-style USART.
//!
//! 32-bit registers, 16-bit `BRR` holding the divisor directly (mantissa and
//! fraction together equal `clock_hz / baud` in oversampling-by-16 mode).
//! A divisor below 16 would leave the mantissa at zero, which the USART
//! does not support.

use bitflags::bitflags;
use irqserial_mmio::register_block;

use crate::hw::{Control, Status, UartPeripheral};

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

/// USART1 register base (APB2).
pub const USART1_BASE: usize = 0x4001_3800;
/// USART2 register base (APB1).
pub const USART2_BASE: usize = 0x4000_4400;
/// USART3 register base (APB1).
pub const USART3_BASE: usize = 0x4000_4800;

/// USART1 global interrupt number.
pub const USART1_IRQ: u16 = 37;
/// USART2 global interrupt number.
pub const USART2_IRQ: u16 = 38;
/// USART3 global interrupt number.
pub const USART3_IRQ: u16 = 39;

// ---------------------------------------------------------------------------
// Bitflag types
// ---------------------------------------------------------------------------

bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sr: u32 {
        /// Parity error.
        const PE                = 1 << 0;
        /// Framing error.
        const FE                = 1 << 1;
        /// Noise flag.
        const NF                = 1 << 2;
        /// Overrun error.
        const ORE               = 1 << 3;
        /// Read data register not empty.
        const RXNE              = 1 << 5;
        /// Transmission complete.
        const TC                = 1 << 6;
        /// Transmit data register empty.
        const TXE               = 1 << 7;
    }
}

bitflags! {
    /// Control register 1 bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr1: u32 {
        /// Receiver enable.
        const RE                = 1 << 2;
        /// Transmitter enable.
        const TE                = 1 << 3;
        /// RXNE interrupt enable.
        const RXNEIE            = 1 << 5;
        /// TXE interrupt enable.
        const TXEIE             = 1 << 7;
        /// Parity control enable.
        const PCE               = 1 << 10;
        /// Word length (set: 9 data bits).
        const M                 = 1 << 12;
        /// USART enable.
        const UE                = 1 << 13;

        /// Bits owned by [`Control`].
        const CONTROL = Self::UE.bits()
            | Self::RE.bits()
            | Self::TE.bits()
            | Self::RXNEIE.bits()
            | Self::TXEIE.bits();
    }
}

register_block! {
    /// STM32F1 USART registers.
    pub UsartRegs {
        /// Status register.
        [0x00; u32; rw] sr => Sr,
        /// Data register.
        [0x04; u32; rw] dr,
        /// Baud rate register.
        [0x08; u32; rw] brr,
        /// Control register 1.
        [0x0C; u32; rw] cr1 => Cr1,
        /// Control register 2.
        [0x10; u32; rw] cr2,
        /// Control register 3.
        [0x14; u32; rw] cr3,
    }
}

// ---------------------------------------------------------------------------
// Stm32Usart
// ---------------------------------------------------------------------------

/// An STM32F1 USART channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stm32Usart {
    regs: UsartRegs,
}

impl Stm32Usart {
    /// Creates an accessor for the USART at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be a USART register window (e.g. [`USART1_BASE`]) whose
    /// clock is enabled, and no other code may drive this USART.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            // SAFETY: Forwarded from the caller.
            regs: unsafe { UsartRegs::new(base) },
        }
    }

    /// Returns the raw register block.
    #[must_use]
    pub const fn regs(&self) -> &UsartRegs {
        &self.regs
    }
}

impl UartPeripheral for Stm32Usart {
    const MIN_DIVISOR: u32 = 16;
    const MAX_DIVISOR: u32 = 0xFFFF;

    fn status(&self) -> Status {
        let sr = self.regs.sr();
        let mut status = Status::empty();
        status.set(Status::RX_READY, sr.contains(Sr::RXNE));
        status.set(Status::TX_EMPTY, sr.contains(Sr::TXE));
        status
    }

    fn read_data(&self) -> u8 {
        self.regs.dr().to_le_bytes()[0]
    }

    fn write_data(&self, byte: u8) {
        self.regs.set_dr(u32::from(byte));
    }

    fn set_baud_divisor(&self, divisor: u32) {
        self.regs.set_brr(divisor & Self::MAX_DIVISOR);
    }

    fn set_frame_8n1(&self) {
        self.regs.modify_cr1(|cr1| cr1 - (Cr1::M | Cr1::PCE));
        // One stop bit, no LIN or synchronous clock.
        self.regs.set_cr2(0);
        // No RTS/CTS flow control, no DMA, no half-duplex or IrDA.
        self.regs.set_cr3(0);
    }

    fn clear_status(&self) {
        // SR then DR clears RXNE and the error flags.
        let _ = self.regs.sr();
        let _ = self.regs.dr();
        // RXNE and TC are rc_w0; TXE ignores writes.
        self.regs.set_sr(Sr::empty());
    }

    fn control(&self) -> Control {
        let cr1 = self.regs.cr1();
        let mut control = Control::empty();
        control.set(Control::ENABLE, cr1.contains(Cr1::UE));
        control.set(Control::RX_ENABLE, cr1.contains(Cr1::RE));
        control.set(Control::TX_ENABLE, cr1.contains(Cr1::TE));
        control.set(Control::RX_IRQ, cr1.contains(Cr1::RXNEIE));
        control.set(Control::TX_IRQ, cr1.contains(Cr1::TXEIE));
        control
    }

    fn set_control(&self, control: Control) {
        let mut bits = Cr1::empty();
        bits.set(Cr1::UE, control.contains(Control::ENABLE));
        bits.set(Cr1::RE, control.contains(Control::RX_ENABLE));
        bits.set(Cr1::TE, control.contains(Control::TX_ENABLE));
        bits.set(Cr1::RXNEIE, control.contains(Control::RX_IRQ));
        bits.set(Cr1::TXEIE, control.contains(Control::TX_IRQ));
        self.regs.modify_cr1(|cr1| (cr1 - Cr1::CONTROL) | bits);
    }
}
