use core::fmt;
use ::x86_64::instructions::port::Port;

use crate::IrqSafeLock;

// 16550 UART on COM1, used as the kernel log sink.

const COM1_BASE: u16 = 0x3F8;

const DATA: u16 = 0;
const INTERRUPT_ENABLE: u16 = 1;
const FIFO_CONTROL: u16 = 2;
const LINE_CONTROL: u16 = 3;
const MODEM_CONTROL: u16 = 4;
const LINE_STATUS: u16 = 5;

const LINE_STATUS_TX_EMPTY: u8 = 0x20;

pub static COM1: IrqSafeLock<SerialPort> = IrqSafeLock::new(SerialPort::new(COM1_BASE));

pub struct SerialPort {
    base_port: u16,
}

impl SerialPort {
    pub const fn new(base_port: u16) -> Self {
        Self { base_port }
    }

    /// Program 38400 baud, 8N1, FIFOs on.
    ///
    /// # Safety
    /// `base_port` must address a 16550-compatible UART.
    pub unsafe fn init(&self) {
        unsafe {
            self.outb(INTERRUPT_ENABLE, 0x00);
            // DLAB on, divisor 3
            self.outb(LINE_CONTROL, 0x80);
            self.outb(DATA, 0x03);
            self.outb(INTERRUPT_ENABLE, 0x00);
            self.outb(LINE_CONTROL, 0x03);
            self.outb(FIFO_CONTROL, 0xC7);
            self.outb(MODEM_CONTROL, 0x0B);
        }
    }

    fn is_transmit_empty(&self) -> bool {
        // SAFETY: reading the line status register has no side effects
        (unsafe { self.inb(LINE_STATUS) } & LINE_STATUS_TX_EMPTY) != 0
    }

    pub fn send(&self, data: u8) {
        while !self.is_transmit_empty() {
            core::hint::spin_loop();
        }
        // SAFETY: the transmit holding register is empty
        unsafe { self.outb(DATA, data) };
    }

    unsafe fn outb(&self, offset: u16, data: u8) {
        let mut port: Port<u8> = Port::new(self.base_port + offset);
        unsafe { port.write(data) };
    }

    unsafe fn inb(&self, offset: u16) -> u8 {
        let mut port: Port<u8> = Port::new(self.base_port + offset);
        unsafe { port.read() }
    }
}

impl fmt::Write for SerialPort {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.send(byte);
        }
        Ok(())
    }
}
