//! Host-side test doubles for the hardware traits.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::vec::Vec;

use irqserial_core::sync::interrupts_enabled;

use crate::hw::{Control, InterruptController, Status, UartPeripheral};

/// A UART whose line is a pair of host queues.
///
/// Bytes injected with [`inject`](Self::inject) are served by `read_data`
/// while `RX_READY` is reported; bytes passed to `write_data` land in
/// [`sent`](Self::sent). Every register write is counted, and writes made
/// while interrupts were unmasked are counted separately.
pub struct MockUart {
    rx: RefCell<VecDeque<u8>>,
    sent: RefCell<Vec<u8>>,
    tx_ready: Cell<bool>,
    control: Cell<Control>,
    divisor: Cell<Option<u32>>,
    framed: Cell<bool>,
    status_clears: Cell<usize>,
    writes: Cell<usize>,
    unmasked_writes: Cell<usize>,
}

impl MockUart {
    pub fn new() -> Self {
        Self {
            rx: RefCell::new(VecDeque::new()),
            sent: RefCell::new(Vec::new()),
            tx_ready: Cell::new(true),
            control: Cell::new(Control::empty()),
            divisor: Cell::new(None),
            framed: Cell::new(false),
            status_clears: Cell::new(0),
            writes: Cell::new(0),
            unmasked_writes: Cell::new(0),
        }
    }

    /// Queues bytes as if they arrived on the line.
    pub fn inject(&self, bytes: &[u8]) {
        self.rx.borrow_mut().extend(bytes);
    }

    /// Bytes written to the data register so far.
    pub fn sent(&self) -> Vec<u8> {
        self.sent.borrow().clone()
    }

    /// Sets whether the transmit data register reports empty.
    pub fn set_tx_ready(&self, ready: bool) {
        self.tx_ready.set(ready);
    }

    pub fn divisor(&self) -> Option<u32> {
        self.divisor.get()
    }

    pub fn framed(&self) -> bool {
        self.framed.get()
    }

    pub fn status_clears(&self) -> usize {
        self.status_clears.get()
    }

    /// Total register writes.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Register writes made with interrupts enabled.
    pub fn unmasked_writes(&self) -> usize {
        self.unmasked_writes.get()
    }

    /// Returns `true` if an enabled interrupt condition is pending.
    pub fn irq_pending(&self) -> bool {
        let status = self.status();
        let control = self.control.get();
        (status.contains(Status::RX_READY) && control.contains(Control::RX_IRQ))
            || (status.contains(Status::TX_EMPTY) && control.contains(Control::TX_IRQ))
    }

    fn record_write(&self) {
        self.writes.set(self.writes.get() + 1);
        if interrupts_enabled() {
            self.unmasked_writes.set(self.unmasked_writes.get() + 1);
        }
    }
}

impl UartPeripheral for MockUart {
    const MIN_DIVISOR: u32 = 16;
    const MAX_DIVISOR: u32 = 0xFFFF;

    fn status(&self) -> Status {
        let mut status = Status::empty();
        status.set(Status::RX_READY, !self.rx.borrow().is_empty());
        status.set(Status::TX_EMPTY, self.tx_ready.get());
        status
    }

    fn read_data(&self) -> u8 {
        self.rx.borrow_mut().pop_front().unwrap_or(0)
    }

    fn write_data(&self, byte: u8) {
        self.record_write();
        self.sent.borrow_mut().push(byte);
    }

    fn set_baud_divisor(&self, divisor: u32) {
        self.record_write();
        self.divisor.set(Some(divisor));
    }

    fn set_frame_8n1(&self) {
        self.record_write();
        self.framed.set(true);
    }

    fn clear_status(&self) {
        self.record_write();
        self.status_clears.set(self.status_clears.get() + 1);
    }

    fn control(&self) -> Control {
        self.control.get()
    }

    fn set_control(&self, control: Control) {
        self.record_write();
        self.control.set(control);
    }
}

/// Records which IRQs were unmasked and masked.
#[derive(Default)]
pub struct MockController {
    pub unmasked: RefCell<Vec<u16>>,
    pub masked: RefCell<Vec<u16>>,
}

impl InterruptController for MockController {
    fn unmask_irq(&self, irq: u16) {
        self.unmasked.borrow_mut().push(irq);
    }

    fn mask_irq(&self, irq: u16) {
        self.masked.borrow_mut().push(irq);
    }
}
