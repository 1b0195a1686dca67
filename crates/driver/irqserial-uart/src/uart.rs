//! The interrupt-driven UART context.
//!
//! A [`Uart`] owns one peripheral channel and two byte queues. The interrupt
//! handler ([`Uart::on_interrupt`]) moves bytes between the data register and
//! the queues; the foreground ([`Uart::send_byte`], [`Uart::receive_byte`])
//! only touches the queues, so neither side ever waits on the line.
//!
//! Each queue index has exactly one writer:
//!
//! | Queue | Producer | Consumer |
//! |-------|----------|----------|
//! | RX | `on_interrupt` | `receive_byte` |
//! | TX | `send_byte` | `on_interrupt` |
//!
//! Foreground operations run inside an [`IrqGuard`], so the handler never
//! observes a half-finished foreground update of an index, a counter or the
//! control register.
//!
//! # Example
//!
//! ```ignore
//! use irqserial_uart::chip::nvic::Nvic;
//! use irqserial_uart::chip::stm32::{Stm32Usart, USART1_BASE, USART1_IRQ};
//! use irqserial_uart::{Uart, UartConfig};
//!
//! // SAFETY: USART1 is clocked and owned by this static.
//! static SERIAL: Uart<Stm32Usart> = Uart::new(unsafe { Stm32Usart::new(USART1_BASE) });
//! const CONFIG: UartConfig = UartConfig::BUILD.validated::<Stm32Usart>();
//!
//! #[interrupt]
//! fn USART1() {
//!     SERIAL.on_interrupt();
//! }
//!
//! fn main() -> ! {
//!     SERIAL.configure(CONFIG, unsafe { &Nvic::new() }, USART1_IRQ).ok();
//!     loop {
//!         if let Some(byte) = SERIAL.receive_byte() {
//!             let _ = SERIAL.send_byte(byte);
//!         }
//!     }
//! }
//! ```

use core::fmt;

use irqserial_core::fifo::Fifo;
use irqserial_core::sync::{Counter, IrqGuard, without_interrupts};

use crate::config::UartConfig;
use crate::error::{ConfigError, QueueFull};
use crate::hw::{Control, InterruptController, Status, UartPeripheral};

/// Default receive queue size (15 usable bytes).
pub const DEFAULT_RX_SIZE: usize = 16;
/// Default transmit queue size (127 usable bytes).
pub const DEFAULT_TX_SIZE: usize = 128;

/// A UART channel with interrupt-driven receive and transmit queues.
///
/// `RX` and `TX` are queue sizes; one slot of each is kept free to tell full
/// from empty.
///
/// The context is meant to live in a `static` shared by the foreground and
/// the UART interrupt vector, on a single core. The foreground side must be
/// one execution context: two threads calling `send_byte` concurrently would
/// both act as the TX producer.
pub struct Uart<P, const RX: usize = DEFAULT_RX_SIZE, const TX: usize = DEFAULT_TX_SIZE> {
    periph: P,
    rx: Fifo<RX>,
    tx: Fifo<TX>,
    rx_bytes: Counter,
    tx_bytes: Counter,
    rx_dropped: Counter,
}

impl<P: UartPeripheral, const RX: usize, const TX: usize> Uart<P, RX, TX> {
    /// Wraps `periph` with empty queues and zeroed counters.
    ///
    /// The peripheral is not touched until [`configure`](Self::configure).
    #[must_use]
    pub const fn new(periph: P) -> Self {
        Self {
            periph,
            rx: Fifo::new(),
            tx: Fifo::new(),
            rx_bytes: Counter::new(),
            tx_bytes: Counter::new(),
            rx_dropped: Counter::new(),
        }
    }

    /// Programs the line and starts interrupt-driven reception.
    ///
    /// Stops the peripheral, discards both queues, zeroes the counters,
    /// programs the divisor and 8N1 framing, enables the receiver,
    /// transmitter and receive interrupt, then unmasks `irq` at `intc`.
    /// The transmit interrupt stays off until the first byte is queued.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaudOutOfRange`] if `config` yields a divisor
    /// outside `P::MIN_DIVISOR..=P::MAX_DIVISOR`. Nothing is written to the
    /// peripheral in that case.
    pub fn configure<C: InterruptController + ?Sized>(
        &self,
        config: UartConfig,
        intc: &C,
        irq: u16,
    ) -> Result<(), ConfigError> {
        let divisor = match config.check::<P>() {
            Ok(divisor) => divisor,
            Err(err) => {
                log::warn!(
                    "uart: {} Hz / {} baud rejected: {err}",
                    config.clock_hz,
                    config.baud
                );
                return Err(err);
            }
        };

        {
            let _guard = IrqGuard::new();
            self.periph.set_control(Control::empty());

            // SAFETY: Interrupts are masked and the peripheral is stopped, so
            // neither queue side can run.
            unsafe {
                self.rx.clear();
                self.tx.clear();
            }
            self.rx_bytes.reset();
            self.tx_bytes.reset();
            self.rx_dropped.reset();

            self.periph.set_baud_divisor(divisor);
            self.periph.set_frame_8n1();
            self.periph.clear_status();
            self.periph.set_control(Control::RUNNING);
        }

        intc.unmask_irq(irq);
        log::debug!(
            "uart: {} Hz / {} baud, divisor {divisor}, irq {irq}",
            config.clock_hz,
            config.baud
        );
        Ok(())
    }

    /// Masks `irq` at `intc` and switches the peripheral off.
    ///
    /// Queued bytes stay queued; the next [`configure`](Self::configure)
    /// discards them. A byte already in the shift register may be cut short.
    pub fn shutdown<C: InterruptController + ?Sized>(&self, intc: &C, irq: u16) {
        intc.mask_irq(irq);
        without_interrupts(|_| self.periph.set_control(Control::empty()));
        log::debug!("uart: stopped, irq {irq} masked");
    }

    /// Services the UART interrupt.
    ///
    /// Call from the UART's interrupt vector only, with interrupts masked
    /// (the vector must not nest with itself). Handles a received byte and a
    /// free transmit register in the same pass if both are pending.
    pub fn on_interrupt(&self) {
        let status = self.periph.status();

        if status.contains(Status::RX_READY) {
            // Read even when the queue is full: it acknowledges the byte.
            let byte = self.periph.read_data();
            // SAFETY: The handler is the only RX producer.
            let mut rx = unsafe { self.rx.producer() };
            if !rx.try_push(byte) {
                self.rx_dropped.increment();
            }
            self.rx_bytes.increment();
        }

        if status.contains(Status::TX_EMPTY) {
            let control = self.periph.control();
            // The vector may be shared with the receive source; a disarmed
            // transmitter must not drain the queue.
            if control.contains(Control::TX_IRQ) {
                // SAFETY: The handler is the only TX consumer.
                let mut tx = unsafe { self.tx.consumer() };
                match tx.try_pop() {
                    Some(byte) => {
                        self.periph.write_data(byte);
                        self.tx_bytes.increment();
                    }
                    None => self.periph.set_control(control - Control::TX_IRQ),
                }
            }
        }
    }

    /// Queues `byte` for transmission and arms the transmit interrupt.
    ///
    /// # Errors
    ///
    /// Returns [`QueueFull`] if the TX queue has no free slot; the queue is
    /// left unchanged.
    pub fn send_byte(&self, byte: u8) -> Result<(), QueueFull> {
        let _guard = IrqGuard::new();
        // SAFETY: The foreground is the only TX producer.
        let mut tx = unsafe { self.tx.producer() };
        if !tx.try_push(byte) {
            return Err(QueueFull);
        }
        self.periph.set_control(self.periph.control() | Control::TX_IRQ);
        Ok(())
    }

    /// Takes the oldest received byte, or `None` if nothing has arrived.
    pub fn receive_byte(&self) -> Option<u8> {
        let _guard = IrqGuard::new();
        // SAFETY: The foreground is the only RX consumer.
        let mut rx = unsafe { self.rx.consumer() };
        rx.try_pop()
    }

    /// Queues as much of `bytes` as fits and returns how many were queued.
    ///
    /// Interrupts are masked per byte, not for the whole slice.
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&byte| self.send_byte(byte).is_ok())
            .count()
    }

    /// Fills `buf` from the RX queue and returns how many bytes were read.
    pub fn read_bytes(&self, buf: &mut [u8]) -> usize {
        let mut read = 0;
        for slot in buf.iter_mut() {
            match self.receive_byte() {
                Some(byte) => *slot = byte,
                None => break,
            }
            read += 1;
        }
        read
    }

    /// Returns a [`fmt::Write`] adapter for formatted output.
    #[must_use]
    pub fn writer(&self) -> UartWriter<'_, P, RX, TX> {
        UartWriter { uart: self }
    }

    /// Bytes received and not yet taken.
    #[must_use]
    pub fn rx_pending(&self) -> usize {
        without_interrupts(|_| self.rx.len())
    }

    /// Bytes queued and not yet handed to the peripheral.
    #[must_use]
    pub fn tx_pending(&self) -> usize {
        without_interrupts(|_| self.tx.len())
    }

    /// Bytes read from the data register since [`configure`](Self::configure),
    /// including dropped ones.
    #[must_use]
    pub fn rx_bytes(&self) -> u32 {
        without_interrupts(|_| self.rx_bytes.get())
    }

    /// Bytes written to the data register since [`configure`](Self::configure).
    #[must_use]
    pub fn tx_bytes(&self) -> u32 {
        without_interrupts(|_| self.tx_bytes.get())
    }

    /// Received bytes lost because the RX queue was full.
    #[must_use]
    pub fn rx_dropped(&self) -> u32 {
        without_interrupts(|_| self.rx_dropped.get())
    }

    /// Returns `true` while the transmit interrupt is enabled.
    #[must_use]
    pub fn tx_armed(&self) -> bool {
        without_interrupts(|_| self.periph.control().contains(Control::TX_IRQ))
    }

    /// Returns the underlying peripheral.
    #[must_use]
    pub fn peripheral(&self) -> &P {
        &self.periph
    }
}

impl<P, const RX: usize, const TX: usize> fmt::Debug for Uart<P, RX, TX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Uart")
            .field("rx", &self.rx)
            .field("tx", &self.tx)
            .field("rx_bytes", &self.rx_bytes)
            .field("tx_bytes", &self.tx_bytes)
            .field("rx_dropped", &self.rx_dropped)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// UartWriter
// ---------------------------------------------------------------------------

/// [`fmt::Write`] over a [`Uart`]'s transmit queue.
///
/// `\n` is sent as `\r\n`. Writing never waits: if the queue fills up the
/// write fails with [`fmt::Error`] and the bytes already queued stay queued.
pub struct UartWriter<'a, P, const RX: usize, const TX: usize> {
    uart: &'a Uart<P, RX, TX>,
}

impl<P: UartPeripheral, const RX: usize, const TX: usize> fmt::Write for UartWriter<'_, P, RX, TX> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.uart.send_byte(b'\r').map_err(|_| fmt::Error)?;
            }
            self.uart.send_byte(byte).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}
