//! ATmega USART0 (ATmega48/88/168/328 family).
//!
//! 8-bit registers in data space. The bit-rate generator divides by
//! `16 * (UBRR + 1)` in normal-speed mode (`U2X` clear), so a
//! `clock_hz / baud` divisor becomes `UBRR = round(divisor / 16) - 1`.
//! Divisors below 16 would need a bit shorter than `UBRR = 0` gives and are
//! rejected; 16 itself is the exact `clock_hz / 16` rate.
//!
//! There is no global enable bit: [`Control::ENABLE`] reads back as set
//! whenever the receiver or transmitter is on, and is ignored on write.

use bitflags::bitflags;
use irqserial_mmio::register_block;

use crate::hw::{Control, Status, UartPeripheral};

/// USART0 register base in data space.
pub const USART0_BASE: usize = 0xC0;

/// `USART_RX` vector number.
pub const USART0_RX_VECTOR: u16 = 18;
/// `USART_UDRE` vector number.
pub const USART0_UDRE_VECTOR: u16 = 19;

/// Largest value of the 12-bit `UBRR` register.
const UBRR_MAX: u32 = 0x0FFF;

bitflags! {
    /// `UCSRnA` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ucsra: u8 {
        /// Multi-processor communication mode.
        const MPCM              = 1 << 0;
        /// Double transmission speed.
        const U2X               = 1 << 1;
        /// Parity error.
        const UPE               = 1 << 2;
        /// Data overrun.
        const DOR               = 1 << 3;
        /// Frame error.
        const FE                = 1 << 4;
        /// Data register empty.
        const UDRE              = 1 << 5;
        /// Transmit complete (write one to clear).
        const TXC               = 1 << 6;
        /// Receive complete.
        const RXC               = 1 << 7;
    }
}

bitflags! {
    /// `UCSRnB` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ucsrb: u8 {
        /// Ninth transmit data bit.
        const TXB8              = 1 << 0;
        /// Ninth receive data bit.
        const RXB8              = 1 << 1;
        /// Character size bit 2.
        const UCSZ2             = 1 << 2;
        /// Transmitter enable.
        const TXEN              = 1 << 3;
        /// Receiver enable.
        const RXEN              = 1 << 4;
        /// Data register empty interrupt enable.
        const UDRIE             = 1 << 5;
        /// TX complete interrupt enable.
        const TXCIE             = 1 << 6;
        /// RX complete interrupt enable.
        const RXCIE             = 1 << 7;

        /// Bits owned by [`Control`].
        const CONTROL = Self::RXEN.bits()
            | Self::TXEN.bits()
            | Self::RXCIE.bits()
            | Self::UDRIE.bits();
    }
}

bitflags! {
    /// `UCSRnC` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Ucsrc: u8 {
        /// Clock polarity (synchronous mode only).
        const UCPOL             = 1 << 0;
        /// Character size bit 0.
        const UCSZ0             = 1 << 1;
        /// Character size bit 1.
        const UCSZ1             = 1 << 2;
        /// Stop bit select (set: 2 stop bits).
        const USBS              = 1 << 3;
        /// Parity mode bit 0.
        const UPM0              = 1 << 4;
        /// Parity mode bit 1.
        const UPM1              = 1 << 5;
        /// Mode select bit 0.
        const UMSEL0            = 1 << 6;
        /// Mode select bit 1.
        const UMSEL1            = 1 << 7;

        /// Asynchronous, 8 data bits, no parity, 1 stop bit.
        const EIGHT_N_ONE = Self::UCSZ0.bits() | Self::UCSZ1.bits();
    }
}

register_block! {
    /// ATmega USART0 registers.
    pub Usart0Regs {
        /// Control and status register A.
        [0x00; u8; rw] ucsra => Ucsra,
        /// Control and status register B.
        [0x01; u8; rw] ucsrb => Ucsrb,
        /// Control and status register C.
        [0x02; u8; rw] ucsrc => Ucsrc,
        /// Baud rate register, low byte.
        [0x04; u8; rw] ubrrl,
        /// Baud rate register, high nibble.
        [0x05; u8; rw] ubrrh,
        /// Data register.
        [0x06; u8; rw] udr,
    }
}

/// Converts a `clock_hz / baud` divisor to a `UBRR` value, rounding to the
/// nearest rate the hardware can produce.
#[must_use]
pub const fn ubrr_for_divisor(divisor: u32) -> u32 {
    let ubrr = (divisor.saturating_add(8) / 16).saturating_sub(1);
    if ubrr > UBRR_MAX { UBRR_MAX } else { ubrr }
}

/// An ATmega USART channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvrUsart {
    regs: Usart0Regs,
}

impl AvrUsart {
    /// Creates an accessor for the USART at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be a USART register block in data space (e.g.
    /// [`USART0_BASE`]) and no other code may drive this USART.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            // SAFETY: Forwarded from the caller.
            regs: unsafe { Usart0Regs::new(base) },
        }
    }

    /// Returns the raw register block.
    #[must_use]
    pub const fn regs(&self) -> &Usart0Regs {
        &self.regs
    }
}

impl UartPeripheral for AvrUsart {
    const MIN_DIVISOR: u32 = 16;
    const MAX_DIVISOR: u32 = 16 * (UBRR_MAX + 1) - 1;

    fn status(&self) -> Status {
        let ucsra = self.regs.ucsra();
        let mut status = Status::empty();
        status.set(Status::RX_READY, ucsra.contains(Ucsra::RXC));
        status.set(Status::TX_EMPTY, ucsra.contains(Ucsra::UDRE));
        status
    }

    fn read_data(&self) -> u8 {
        self.regs.udr()
    }

    fn write_data(&self, byte: u8) {
        self.regs.set_udr(byte);
    }

    fn set_baud_divisor(&self, divisor: u32) {
        let [lo, hi, ..] = ubrr_for_divisor(divisor).to_le_bytes();
        // The high byte is latched by the write to the low byte.
        self.regs.set_ubrrh(hi);
        self.regs.set_ubrrl(lo);
        self.regs.modify_ucsra(|ucsra| ucsra - Ucsra::U2X);
    }

    fn set_frame_8n1(&self) {
        self.regs.modify_ucsrb(|ucsrb| ucsrb - Ucsrb::UCSZ2);
        self.regs.set_ucsrc(Ucsrc::EIGHT_N_ONE);
    }

    fn clear_status(&self) {
        // Reading UDR pops RXC and the error flags with it.
        let _ = self.regs.udr();
        // TXC is write-one-to-clear; FE/DOR/UPE must be written as zero.
        self.regs.set_ucsra(Ucsra::TXC);
    }

    fn control(&self) -> Control {
        let ucsrb = self.regs.ucsrb();
        let mut control = Control::empty();
        control.set(
            Control::ENABLE,
            ucsrb.intersects(Ucsrb::RXEN | Ucsrb::TXEN),
        );
        control.set(Control::RX_ENABLE, ucsrb.contains(Ucsrb::RXEN));
        control.set(Control::TX_ENABLE, ucsrb.contains(Ucsrb::TXEN));
        control.set(Control::RX_IRQ, ucsrb.contains(Ucsrb::RXCIE));
        control.set(Control::TX_IRQ, ucsrb.contains(Ucsrb::UDRIE));
        control
    }

    fn set_control(&self, control: Control) {
        let mut bits = Ucsrb::empty();
        bits.set(Ucsrb::RXEN, control.contains(Control::RX_ENABLE));
        bits.set(Ucsrb::TXEN, control.contains(Control::TX_ENABLE));
        bits.set(Ucsrb::RXCIE, control.contains(Control::RX_IRQ));
        bits.set(Ucsrb::UDRIE, control.contains(Control::TX_IRQ));
        self.regs.modify_ucsrb(|ucsrb| (ucsrb - Ucsrb::CONTROL) | bits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigError, NoController, Uart, UartConfig};

    const UCSRA: usize = 0;
    const UCSRB: usize = 1;
    const UCSRC: usize = 2;
    const UBRRL: usize = 4;
    const UBRRH: usize = 5;
    const UDR: usize = 6;

    fn usart(window: &mut [u8; 7]) -> AvrUsart {
        // SAFETY: `window` outlives the accessor and covers every register.
        unsafe { AvrUsart::new(window.as_mut_ptr() as usize) }
    }

    #[test]
    fn ubrr_matches_setbaud_rounding() {
        // 16 MHz, 9600 baud: 1666 / 16 rounds to 104, UBRR = 103.
        assert_eq!(ubrr_for_divisor(1666), 103);
        // 16 MHz, 115200 baud: 138 / 16 rounds to 9, UBRR = 8.
        assert_eq!(ubrr_for_divisor(138), 8);
        assert_eq!(ubrr_for_divisor(1), 0);
        assert_eq!(ubrr_for_divisor(AvrUsart::MAX_DIVISOR), UBRR_MAX);
        assert_eq!(ubrr_for_divisor(u32::MAX), UBRR_MAX);
    }

    #[test]
    fn baud_divisor_splits_ubrr_and_clears_u2x() {
        let mut window = [0u8; 7];
        window[UCSRA] = (Ucsra::U2X | Ucsra::UDRE).bits();
        usart(&mut window).set_baud_divisor(40_000);
        // 40_008 / 16 - 1 = 2499 = 0x9C3
        assert_eq!(window[UBRRL], 0xC3);
        assert_eq!(window[UBRRH], 0x09);
        assert_eq!(window[UCSRA], Ucsra::UDRE.bits());
    }

    #[test]
    fn status_maps_rxc_and_udre() {
        let mut window = [0u8; 7];
        window[UCSRA] = (Ucsra::RXC | Ucsra::UDRE | Ucsra::TXC).bits();
        assert_eq!(
            usart(&mut window).status(),
            Status::RX_READY | Status::TX_EMPTY
        );
    }

    #[test]
    fn frame_8n1() {
        let mut window = [0u8; 7];
        window[UCSRB] = (Ucsrb::UCSZ2 | Ucsrb::RXEN).bits();
        window[UCSRC] = 0xFF;
        usart(&mut window).set_frame_8n1();
        assert_eq!(window[UCSRB], Ucsrb::RXEN.bits());
        assert_eq!(window[UCSRC], 0x06);
    }

    #[test]
    fn data_register() {
        let mut window = [0u8; 7];
        window[UDR] = b'q';
        let uart = usart(&mut window);
        assert_eq!(uart.read_data(), b'q');
        uart.write_data(b'!');
        assert_eq!(window[UDR], b'!');
    }

    #[test]
    fn control_maps_onto_ucsrb() {
        let mut window = [0u8; 7];
        window[UCSRB] = Ucsrb::TXB8.bits();
        let uart = usart(&mut window);

        uart.set_control(Control::RUNNING);
        assert_eq!(uart.control(), Control::RUNNING);
        assert_eq!(
            window[UCSRB],
            (Ucsrb::TXB8 | Ucsrb::RXEN | Ucsrb::TXEN | Ucsrb::RXCIE).bits()
        );
    }

    #[test]
    fn enable_has_no_register_bit() {
        let mut window = [0u8; 7];
        let uart = usart(&mut window);
        uart.set_control(Control::ENABLE | Control::TX_IRQ);
        assert_eq!(uart.control(), Control::TX_IRQ);
    }

    #[test]
    fn clear_status_acknowledges_txc_only() {
        let mut window = [0u8; 7];
        window[UCSRA] = (Ucsra::TXC | Ucsra::FE | Ucsra::U2X).bits();
        usart(&mut window).clear_status();
        assert_eq!(window[UCSRA], Ucsra::TXC.bits());
    }

    #[test]
    fn divisor_below_sixteen_rejected() {
        assert_eq!(
            UartConfig::new(16_000_000, 4_000_000).check::<AvrUsart>(),
            Err(ConfigError::BaudOutOfRange { divisor: 4 })
        );
        // 1 Mbaud at 16 MHz is the exact UBRR = 0 rate.
        assert_eq!(
            UartConfig::new(16_000_000, 1_000_000).check::<AvrUsart>(),
            Ok(16)
        );
        assert_eq!(ubrr_for_divisor(AvrUsart::MIN_DIVISOR), 0);
    }

    #[test]
    fn configure_with_unreachable_baud_leaves_registers_alone() {
        let mut window = [0u8; 7];
        window[UCSRB] = Ucsrb::TXB8.bits();
        window[UBRRL] = 0x67;
        let uart: Uart<AvrUsart> = Uart::new(usart(&mut window));

        assert_eq!(
            uart.configure(UartConfig::new(16_000_000, 4_000_000), &NoController, 0),
            Err(ConfigError::BaudOutOfRange { divisor: 4 })
        );
        assert_eq!(window, [0, Ucsrb::TXB8.bits(), 0, 0, 0x67, 0, 0]);
    }
}
