//! Cortex-M NVIC set-enable / clear-enable registers.

use irqserial_mmio::register_block;

use crate::hw::InterruptController;

/// NVIC base address on ARMv7-M (the `ISER0` register).
pub const NVIC_BASE: usize = 0xE000_E100;

register_block! {
    /// Interrupt set-enable and clear-enable registers.
    ///
    /// Both are write-one-to-act: zero bits are ignored, so no
    /// read-modify-write is needed.
    pub NvicRegs {
        /// Set-enable, IRQs 0..32.
        [0x00; u32; wo] iser0,
        /// Set-enable, IRQs 32..64.
        [0x04; u32; wo] iser1,
        /// Set-enable, IRQs 64..96.
        [0x08; u32; wo] iser2,
        /// Clear-enable, IRQs 0..32.
        [0x80; u32; wo] icer0,
        /// Clear-enable, IRQs 32..64.
        [0x84; u32; wo] icer1,
        /// Clear-enable, IRQs 64..96.
        [0x88; u32; wo] icer2,
    }
}

/// The nested vectored interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nvic {
    regs: NvicRegs,
}

impl Nvic {
    /// Highest IRQ number reachable through the implemented registers.
    pub const MAX_IRQ: u16 = 95;

    /// Returns the NVIC at its architectural address.
    ///
    /// # Safety
    ///
    /// Must run on a Cortex-M core, in privileged mode.
    #[must_use]
    pub const unsafe fn new() -> Self {
        // SAFETY: Forwarded from the caller.
        unsafe { Self::at(NVIC_BASE) }
    }

    /// Returns an NVIC accessor for registers at `base`.
    ///
    /// # Safety
    ///
    /// `base` must map the `ISER`/`ICER` register window.
    #[must_use]
    pub const unsafe fn at(base: usize) -> Self {
        Self {
            // SAFETY: Forwarded from the caller.
            regs: unsafe { NvicRegs::new(base) },
        }
    }
}

impl InterruptController for Nvic {
    fn unmask_irq(&self, irq: u16) {
        let bit = 1u32 << (irq % 32);
        match irq / 32 {
            0 => self.regs.set_iser0(bit),
            1 => self.regs.set_iser1(bit),
            2 => self.regs.set_iser2(bit),
            _ => log::warn!("nvic: irq {irq} out of range, not unmasked"),
        }
    }

    fn mask_irq(&self, irq: u16) {
        let bit = 1u32 << (irq % 32);
        match irq / 32 {
            0 => self.regs.set_icer0(bit),
            1 => self.regs.set_icer1(bit),
            2 => self.regs.set_icer2(bit),
            _ => log::warn!("nvic: irq {irq} out of range, not masked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::stm32::USART2_IRQ;

    const ICER0: usize = 0x80 / 4;

    fn nvic(window: &mut [u32; 35]) -> Nvic {
        // SAFETY: `window` outlives the accessor and covers every register.
        unsafe { Nvic::at(window.as_mut_ptr() as usize) }
    }

    #[test]
    fn unmask_sets_one_bit_in_the_right_iser() {
        let mut window = [0u32; 35];
        nvic(&mut window).unmask_irq(USART2_IRQ);
        assert_eq!(window[1], 1 << 6);
        assert_eq!(window[0], 0);
        assert_eq!(window[2], 0);
    }

    #[test]
    fn mask_sets_one_bit_in_the_right_icer() {
        let mut window = [0u32; 35];
        nvic(&mut window).mask_irq(5);
        assert_eq!(window[ICER0], 1 << 5);

        nvic(&mut window).mask_irq(Nvic::MAX_IRQ);
        assert_eq!(window[ICER0 + 2], 1 << 31);
    }

    #[test]
    fn out_of_range_irq_writes_nothing() {
        let mut window = [0u32; 35];
        nvic(&mut window).unmask_irq(Nvic::MAX_IRQ + 1);
        nvic(&mut window).mask_irq(u16::MAX);
        assert!(window.iter().all(|&word| word == 0));
    }
}
