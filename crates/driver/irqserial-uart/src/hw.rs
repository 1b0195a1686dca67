//! Hardware boundary of the driver.
//!
//! [`UartPeripheral`] abstracts one UART channel's registers behind a
//! chip-neutral view: a [`Status`] word, a data register, a divisor and a
//! [`Control`] word. Each chip family in [`chip`](crate::chip) maps these onto
//! its own register layout. [`InterruptController`] abstracts unmasking the
//! UART's interrupt source.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Bitflag types
// ---------------------------------------------------------------------------

bitflags! {
    /// Chip-neutral UART status.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// A received byte is waiting in the data register.
        const RX_READY          = 1 << 0;
        /// The transmit data register can accept a byte.
        const TX_EMPTY          = 1 << 1;
    }
}

bitflags! {
    /// Chip-neutral UART control bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u8 {
        /// Peripheral enable.
        const ENABLE            = 1 << 0;
        /// Receiver enable.
        const RX_ENABLE         = 1 << 1;
        /// Transmitter enable.
        const TX_ENABLE         = 1 << 2;
        /// Interrupt on [`Status::RX_READY`].
        const RX_IRQ            = 1 << 3;
        /// Interrupt on [`Status::TX_EMPTY`].
        const TX_IRQ            = 1 << 4;

        /// Everything `configure` turns on. The transmit interrupt is armed
        /// later, by the first queued byte.
        const RUNNING = Self::ENABLE.bits()
            | Self::RX_ENABLE.bits()
            | Self::TX_ENABLE.bits()
            | Self::RX_IRQ.bits();
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// One UART channel's registers.
///
/// Register accesses are volatile side effects; reading the data register
/// typically clears [`Status::RX_READY`] and writing it clears
/// [`Status::TX_EMPTY`] until the byte moves to the shift register.
pub trait UartPeripheral {
    /// Smallest `clock_hz / baud` this peripheral can be programmed with.
    const MIN_DIVISOR: u32;

    /// Largest `clock_hz / baud` this peripheral can be programmed with.
    const MAX_DIVISOR: u32;

    /// Reads the status register.
    fn status(&self) -> Status;

    /// Reads the received byte.
    fn read_data(&self) -> u8;

    /// Writes a byte to transmit.
    fn write_data(&self, byte: u8);

    /// Programs the bit-rate generator from `clock_hz / baud`.
    ///
    /// `divisor` is in `Self::MIN_DIVISOR..=Self::MAX_DIVISOR`.
    fn set_baud_divisor(&self, divisor: u32);

    /// Selects 8 data bits, no parity, 1 stop bit, and turns off hardware
    /// flow control and DMA where the peripheral has them.
    fn set_frame_8n1(&self);

    /// Discards any stale received byte and clears sticky status flags.
    fn clear_status(&self);

    /// Reads the control bits.
    fn control(&self) -> Control;

    /// Writes the control bits, leaving unrelated chip-specific bits alone.
    fn set_control(&self, control: Control);
}

/// The interrupt controller in front of the UART.
pub trait InterruptController {
    /// Lets interrupt `irq` reach the CPU.
    fn unmask_irq(&self, irq: u16);

    /// Stops interrupt `irq` from reaching the CPU.
    fn mask_irq(&self, irq: u16);
}

/// For cores with fixed, always-routed interrupt vectors (AVR), where
/// enabling the source in the peripheral is enough.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoController;

impl InterruptController for NoController {
    fn unmask_irq(&self, _irq: u16) {}

    fn mask_irq(&self, _irq: u16) {}
}
